//! Loose batch normalization

use polars::prelude::*;
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::{PipelineError, Result};
use crate::schema::FeatureSchema;

/// Value kind observed in one column across all rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Numeric,
    Text,
    Boolean,
}

impl ColumnKind {
    /// Widest kind able to hold both: text absorbs everything, numbers
    /// absorb booleans
    fn merge(self, other: ColumnKind) -> ColumnKind {
        match (self, other) {
            (a, b) if a == b => a,
            (ColumnKind::Text, _) | (_, ColumnKind::Text) => ColumnKind::Text,
            _ => ColumnKind::Numeric,
        }
    }
}

/// Normalize a batch of instances into a schema-ordered table.
///
/// Steps run in a fixed order: empty check, table coercion, missing-column
/// check, projection. Values are not range-checked here.
pub fn normalize_batch(instances: &[Value], schema: &FeatureSchema) -> Result<DataFrame> {
    if instances.is_empty() {
        return Err(PipelineError::EmptyBatch);
    }

    let table = build_table(instances)?;
    project_to_schema(&table, schema)
}

/// Reject tables lacking schema columns, then keep exactly the schema
/// columns in schema order. Extra columns (identifiers, targets) are dropped.
pub fn project_to_schema(table: &DataFrame, schema: &FeatureSchema) -> Result<DataFrame> {
    let present: HashSet<&str> = table
        .get_column_names()
        .into_iter()
        .map(|name| name.as_str())
        .collect();

    let mut missing: Vec<String> = schema
        .names()
        .into_iter()
        .filter(|name| !present.contains(name))
        .map(str::to_string)
        .collect();

    if !missing.is_empty() {
        missing.sort();
        return Err(PipelineError::MissingColumns(missing));
    }

    table
        .select(schema.names())
        .map_err(|e| PipelineError::MalformedInput(e.to_string()))
}

/// Coerce instances into one table. Keys absent from a row become nulls and
/// every row must be an object. Columns mixing scalar kinds are widened, so
/// whether `63` next to `"63"` is usable is left to the model's numeric cast.
fn build_table(instances: &[Value]) -> Result<DataFrame> {
    let mut rows: Vec<&Map<String, Value>> = Vec::with_capacity(instances.len());
    let mut column_order: Vec<&str> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (idx, instance) in instances.iter().enumerate() {
        let row = instance.as_object().ok_or_else(|| {
            PipelineError::MalformedInput(format!("instance {} is not a JSON object", idx))
        })?;
        for key in row.keys() {
            if seen.insert(key.as_str()) {
                column_order.push(key.as_str());
            }
        }
        rows.push(row);
    }

    let columns = column_order
        .iter()
        .map(|name| build_column(name, &rows))
        .collect::<Result<Vec<Column>>>()?;

    DataFrame::new(columns).map_err(|e| PipelineError::MalformedInput(e.to_string()))
}

fn build_column(name: &str, rows: &[&Map<String, Value>]) -> Result<Column> {
    let mut kind: Option<ColumnKind> = None;

    for (idx, row) in rows.iter().enumerate() {
        let observed = match row.get(name) {
            None | Some(Value::Null) => continue,
            Some(Value::Number(_)) => ColumnKind::Numeric,
            Some(Value::String(_)) => ColumnKind::Text,
            Some(Value::Bool(_)) => ColumnKind::Boolean,
            Some(Value::Array(_)) | Some(Value::Object(_)) => {
                return Err(PipelineError::MalformedInput(format!(
                    "column '{}' holds a nested value in instance {}",
                    name, idx
                )));
            }
        };
        kind = Some(kind.map_or(observed, |k| k.merge(observed)));
    }

    let series = match kind.unwrap_or(ColumnKind::Numeric) {
        ColumnKind::Numeric => {
            let values: Vec<Option<f64>> = rows
                .iter()
                .map(|row| row.get(name).and_then(numeric_value))
                .collect();
            Series::new(name.into(), values)
        }
        ColumnKind::Text => {
            let values: Vec<Option<String>> = rows
                .iter()
                .map(|row| row.get(name).and_then(text_value))
                .collect();
            Series::new(name.into(), values)
        }
        ColumnKind::Boolean => {
            let values: Vec<Option<bool>> = rows
                .iter()
                .map(|row| row.get(name).and_then(Value::as_bool))
                .collect();
            Series::new(name.into(), values)
        }
    };

    Ok(series.into())
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        other => other.as_f64(),
    }
}

/// Scalars rendered so that numbers and booleans survive a later numeric cast
fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn instance() -> Value {
        json!({
            "age": 63, "sex": 1, "cp": 3, "trestbps": 145, "chol": 233, "fbs": 1,
            "restecg": 0, "thalach": 150, "exang": 0, "oldpeak": 2.3, "slope": 0,
            "ca": 0, "thal": 1
        })
    }

    fn column_names(df: &DataFrame) -> Vec<String> {
        df.get_column_names().iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_empty_batch() {
        let err = normalize_batch(&[], &FeatureSchema::heart_disease()).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyBatch));
    }

    #[test]
    fn test_missing_thal_named() {
        let mut row = instance();
        row.as_object_mut().unwrap().remove("thal");

        let err = normalize_batch(&[row], &FeatureSchema::heart_disease()).unwrap_err();
        match err {
            PipelineError::MissingColumns(cols) => assert_eq!(cols, vec!["thal".to_string()]),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_columns_sorted() {
        let mut row = instance();
        let obj = row.as_object_mut().unwrap();
        obj.remove("thal");
        obj.remove("age");
        obj.remove("ca");

        let err = normalize_batch(&[row], &FeatureSchema::heart_disease()).unwrap_err();
        match err {
            PipelineError::MissingColumns(cols) => assert_eq!(cols, vec!["age", "ca", "thal"]),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_extra_identifier_dropped() {
        let mut row = instance();
        row["patient_id"] = json!("P-17");

        let schema = FeatureSchema::heart_disease();
        let df = normalize_batch(&[row], &schema).unwrap();
        assert_eq!(column_names(&df), schema.names());
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn test_non_object_row_is_malformed() {
        let err = normalize_batch(&[instance(), json!(42)], &FeatureSchema::heart_disease()).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput(_)));
    }

    #[test]
    fn test_mixed_number_and_text_widen_to_text() {
        let mut second = instance();
        second["age"] = json!("sixty");
        let df = normalize_batch(&[instance(), second], &FeatureSchema::heart_disease()).unwrap();

        let age = df.column("age").unwrap().as_materialized_series();
        assert_eq!(age.dtype(), &DataType::String);
        let values: Vec<Option<&str>> = age.str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("63"), Some("sixty")]);
    }

    #[test]
    fn test_mixed_number_and_boolean_widen_to_numeric() {
        let mut second = instance();
        second["fbs"] = json!(true);
        let mut first = instance();
        first["fbs"] = json!(0);
        let df = normalize_batch(&[first, second], &FeatureSchema::heart_disease()).unwrap();

        let fbs = df.column("fbs").unwrap().as_materialized_series();
        let values: Vec<Option<f64>> = fbs.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(0.0), Some(1.0)]);
    }

    #[test]
    fn test_nested_value_is_malformed() {
        let mut row = instance();
        row["chol"] = json!({"value": 233});
        let err = normalize_batch(&[row], &FeatureSchema::heart_disease()).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput(_)));
    }

    #[test]
    fn test_out_of_range_values_pass_through() {
        let mut row = instance();
        row["age"] = json!(150);
        let df = normalize_batch(&[row], &FeatureSchema::heart_disease()).unwrap();
        let age = df.column("age").unwrap().as_materialized_series().f64().unwrap().get(0);
        assert_eq!(age, Some(150.0));
    }

    #[test]
    fn test_key_absent_in_one_row_becomes_null() {
        let mut second = instance();
        second.as_object_mut().unwrap().remove("chol");
        let df = normalize_batch(&[instance(), second], &FeatureSchema::heart_disease()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("chol").unwrap().null_count(), 1);
    }

    #[test]
    fn test_project_reorders_permuted_frame() {
        let schema = FeatureSchema::heart_disease();
        let mut names = schema.names();
        names.reverse();
        let columns: Vec<Column> = names
            .iter()
            .map(|n| Series::new((*n).into(), &[1.0_f64]).into())
            .collect();
        let df = DataFrame::new(columns).unwrap();

        let projected = project_to_schema(&df, &schema).unwrap();
        assert_eq!(column_names(&projected), schema.names());
    }
}
