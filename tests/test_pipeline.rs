//! Integration test: prediction pipeline properties against the shipped model

use heart_disease_api::prelude::*;
use polars::prelude::*;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

fn engine() -> InferenceEngine {
    let schema = Arc::new(FeatureSchema::heart_disease());
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("models/heart_disease_model.json");
    let artifact = ModelArtifact::load(path, &schema).unwrap();
    InferenceEngine::new(schema, Arc::new(artifact))
}

fn patients() -> Vec<Value> {
    vec![
        json!({"age": 63, "sex": 1, "cp": 3, "trestbps": 145, "chol": 233, "fbs": 1, "restecg": 0,
               "thalach": 150, "exang": 0, "oldpeak": 2.3, "slope": 0, "ca": 0, "thal": 1}),
        json!({"age": 67, "sex": 1, "cp": 0, "trestbps": 160, "chol": 286, "fbs": 0, "restecg": 0,
               "thalach": 108, "exang": 1, "oldpeak": 1.5, "slope": 1, "ca": 3, "thal": 2}),
        json!({"age": 41, "sex": 0, "cp": 1, "trestbps": 130, "chol": 204, "fbs": 0, "restecg": 0,
               "thalach": 172, "exang": 0, "oldpeak": 1.4, "slope": 2, "ca": 0, "thal": 2}),
    ]
}

#[test]
fn test_batch_preserves_input_order() {
    let engine = engine();
    let batch = engine.predict_batch(&patients()).unwrap();
    assert_eq!(batch.count(), 3);

    for (i, record) in patients().iter().enumerate() {
        let single = engine.predict_single(record).unwrap();
        let row = &batch.predictions()[i];
        assert_eq!(row.label, single.label);
        assert_eq!(row.diagnosis, single.diagnosis);
        assert!((row.disease_risk() - single.disease_risk()).abs() < 1e-12);
    }
}

#[test]
fn test_results_are_consistent() {
    let batch = engine().predict_batch(&patients()).unwrap();
    for result in batch.predictions() {
        assert!((result.probabilities[0] + result.probabilities[1] - 1.0).abs() < 1e-9);
        assert_eq!(result.diagnosis == Diagnosis::HeartDiseaseDetected, result.label == 1);
    }
}

#[test]
fn test_scoring_is_idempotent() {
    let engine = engine();
    let first = engine.predict_batch(&patients()).unwrap();
    let second = engine.predict_batch(&patients()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_permuted_columns_score_identically() {
    let engine = engine();
    let schema = engine.schema();

    let ordered = normalize_batch(&patients(), schema).unwrap();
    let mut reversed_names: Vec<&str> = schema.names();
    reversed_names.reverse();
    let permuted = ordered.select(reversed_names).unwrap();

    let projected = project_to_schema(&permuted, schema).unwrap();
    assert_eq!(projected.get_column_names(), ordered.get_column_names());
    assert!(projected.equals(&ordered));

    let a = engine.predict_frame(&ordered).unwrap();
    let b = engine.predict_frame(&permuted).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_projection_is_noop_on_exact_columns() {
    let engine = engine();
    let frame = normalize_batch(&patients(), engine.schema()).unwrap();
    let projected = project_to_schema(&frame, engine.schema()).unwrap();
    assert!(projected.equals(&frame));
}

#[test]
fn test_batch_missing_value_is_imputed() {
    let mut records = patients();
    records[2].as_object_mut().unwrap().insert("chol".into(), Value::Null);

    let batch = engine().predict_batch(&records).unwrap();
    assert_eq!(batch.count(), 3);
}

#[test]
fn test_single_path_rejects_before_scoring() {
    let mut record = patients().remove(0);
    record["age"] = json!(150);
    record["thal"] = json!(7);

    match engine().predict_single(&record).unwrap_err() {
        PipelineError::Validation(violations) => {
            let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
            assert_eq!(fields, vec!["age", "thal"]);
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_mixed_number_and_numeric_text_scores() {
    let engine = engine();
    let mut records = patients();
    records[1]["age"] = json!("67");

    let mixed = engine.predict_batch(&records).unwrap();
    let numeric = engine.predict_batch(&patients()).unwrap();
    assert_eq!(mixed.count(), 3);
    for (a, b) in mixed.predictions().iter().zip(numeric.predictions()) {
        assert_eq!(a.label, b.label);
        assert!((a.disease_risk() - b.disease_risk()).abs() < 1e-12);
    }
}

#[test]
fn test_mixed_number_and_word_fails_in_model() {
    let mut records = patients();
    records[1]["age"] = json!("sixty");

    match engine().predict_batch(&records).unwrap_err() {
        PipelineError::Inference(msg) => assert!(msg.contains("age")),
        other => panic!("expected inference error, got {:?}", other),
    }
}

#[test]
fn test_mixed_boolean_and_number_scores() {
    let mut records = patients();
    records[0]["fbs"] = json!(true);
    records[1]["fbs"] = json!(0);

    let batch = engine().predict_batch(&records).unwrap();
    assert_eq!(batch.count(), 3);
    assert_eq!(batch.predictions()[0].label, 1);
}
