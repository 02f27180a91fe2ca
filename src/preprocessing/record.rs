//! Strict single-record validation

use polars::prelude::*;
use serde_json::Value;

use crate::error::{FieldViolation, PipelineError, Result};
use crate::schema::{FeatureKind, FeatureSchema, FeatureSpec};

/// Validate one record against every field's kind and inclusive bounds and
/// return a one-row table in schema order.
///
/// All violations are collected so the caller sees every bad field at once.
/// Keys that are not in the schema are ignored.
pub fn normalize_record(record: &Value, schema: &FeatureSchema) -> Result<DataFrame> {
    let fields = record.as_object().ok_or_else(|| {
        PipelineError::Validation(vec![FieldViolation::new("body", "value is not a valid dict")])
    })?;

    let mut violations = Vec::new();
    let mut columns: Vec<Column> = Vec::with_capacity(schema.len());

    for spec in schema.iter() {
        match check_field(spec, fields.get(&spec.name)) {
            Ok(value) => columns.push(Series::new(spec.name.as_str().into(), &[value]).into()),
            Err(constraint) => violations.push(FieldViolation::new(&spec.name, constraint)),
        }
    }

    if !violations.is_empty() {
        return Err(PipelineError::Validation(violations));
    }

    DataFrame::new(columns).map_err(|e| PipelineError::MalformedInput(e.to_string()))
}

fn check_field(spec: &FeatureSpec, value: Option<&Value>) -> std::result::Result<f64, String> {
    let type_error = match spec.kind {
        FeatureKind::Integer => "value is not a valid integer",
        FeatureKind::Real => "value is not a valid float",
    };

    let number = match value {
        None | Some(Value::Null) => return Err("field required".to_string()),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| type_error.to_string())?,
        Some(_) => return Err(type_error.to_string()),
    };

    if !number.is_finite() || (spec.kind == FeatureKind::Integer && number.fract() != 0.0) {
        return Err(type_error.to_string());
    }
    if number < spec.min {
        return Err(format!(
            "ensure this value is greater than or equal to {}",
            spec.format_bound(spec.min)
        ));
    }
    if number > spec.max {
        return Err(format!(
            "ensure this value is less than or equal to {}",
            spec.format_bound(spec.max)
        ));
    }

    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "age": 63, "sex": 1, "cp": 3, "trestbps": 145, "chol": 233, "fbs": 1,
            "restecg": 0, "thalach": 150, "exang": 0, "oldpeak": 2.3, "slope": 0,
            "ca": 0, "thal": 1
        })
    }

    fn violations(err: PipelineError) -> Vec<FieldViolation> {
        match err {
            PipelineError::Validation(v) => v,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_record_in_schema_order() {
        let schema = FeatureSchema::heart_disease();
        let df = normalize_record(&sample(), &schema).unwrap();

        assert_eq!(df.height(), 1);
        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, schema.names());

        let oldpeak = df.column("oldpeak").unwrap().as_materialized_series().f64().unwrap().get(0);
        assert_eq!(oldpeak, Some(2.3));
    }

    #[test]
    fn test_age_above_max_rejected() {
        let mut record = sample();
        record["age"] = json!(150);

        let v = violations(normalize_record(&record, &FeatureSchema::heart_disease()).unwrap_err());
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].field, "age");
        assert_eq!(v[0].constraint, "ensure this value is less than or equal to 120");
    }

    #[test]
    fn test_bounds_inclusive() {
        let mut record = sample();
        record["age"] = json!(120);
        record["oldpeak"] = json!(0.0);
        assert!(normalize_record(&record, &FeatureSchema::heart_disease()).is_ok());
    }

    #[test]
    fn test_missing_and_null_fields_reported_together() {
        let mut record = sample();
        record.as_object_mut().unwrap().remove("thal");
        record["chol"] = Value::Null;
        record["trestbps"] = json!(10);

        let v = violations(normalize_record(&record, &FeatureSchema::heart_disease()).unwrap_err());
        let fields: Vec<&str> = v.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["trestbps", "chol", "thal"]);
        assert_eq!(v[2].constraint, "field required");
        assert_eq!(v[0].constraint, "ensure this value is greater than or equal to 50");
    }

    #[test]
    fn test_fractional_integer_rejected() {
        let mut record = sample();
        record["cp"] = json!(1.5);
        let v = violations(normalize_record(&record, &FeatureSchema::heart_disease()).unwrap_err());
        assert_eq!(v[0].field, "cp");
        assert_eq!(v[0].constraint, "value is not a valid integer");
    }

    #[test]
    fn test_text_value_rejected() {
        let mut record = sample();
        record["oldpeak"] = json!("high");
        let v = violations(normalize_record(&record, &FeatureSchema::heart_disease()).unwrap_err());
        assert_eq!(v[0].constraint, "value is not a valid float");
    }

    #[test]
    fn test_numeric_text_and_booleans_rejected() {
        let mut record = sample();
        record["age"] = json!("63");
        record["fbs"] = json!(true);
        let v = violations(normalize_record(&record, &FeatureSchema::heart_disease()).unwrap_err());
        let fields: Vec<&str> = v.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["age", "fbs"]);
        assert!(v.iter().all(|f| f.constraint == "value is not a valid integer"));
    }

    #[test]
    fn test_extra_keys_ignored() {
        let mut record = sample();
        record["patient_id"] = json!("P-001");
        let df = normalize_record(&record, &FeatureSchema::heart_disease()).unwrap();
        assert_eq!(df.width(), 13);
    }

    #[test]
    fn test_non_object_rejected() {
        let v = violations(normalize_record(&json!([1, 2]), &FeatureSchema::heart_disease()).unwrap_err());
        assert_eq!(v[0].field, "body");
    }
}
