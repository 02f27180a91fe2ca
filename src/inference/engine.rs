//! Inference engine implementation
//!
//! Normalizer -> classifier -> probability fallback -> diagnosis, one
//! result per input row in input order. The engine holds only read-only
//! state and is shared across requests behind an `Arc`.

use polars::prelude::*;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

use super::response::{assemble_single, PredictionBatch, PredictionResult};
use crate::error::{PipelineError, Result};
use crate::model::Classifier;
use crate::preprocessing::{normalize_batch, normalize_record, project_to_schema};
use crate::schema::FeatureSchema;

pub struct InferenceEngine {
    schema: Arc<FeatureSchema>,
    classifier: Arc<dyn Classifier>,
}

impl std::fmt::Debug for InferenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceEngine")
            .field("features", &self.schema.len())
            .field("classifier", &self.classifier.describe())
            .finish()
    }
}

impl InferenceEngine {
    pub fn new(schema: Arc<FeatureSchema>, classifier: Arc<dyn Classifier>) -> Self {
        Self { schema, classifier }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Loose batch entry: `instances` as received in `{"instances": [...]}`
    pub fn predict_batch(&self, instances: &[Value]) -> Result<PredictionBatch> {
        let features = normalize_batch(instances, &self.schema)?;
        Ok(PredictionBatch::new(self.score(&features)?))
    }

    /// Strict single-record entry; validation runs before the model is touched
    pub fn predict_single(&self, record: &Value) -> Result<PredictionResult> {
        let features = normalize_record(record, &self.schema)?;
        assemble_single(self.score(&features)?)
    }

    /// Score an already tabular input (CSV files, for instance)
    pub fn predict_frame(&self, table: &DataFrame) -> Result<PredictionBatch> {
        if table.height() == 0 {
            return Err(PipelineError::EmptyBatch);
        }
        let features = project_to_schema(table, &self.schema)?;
        Ok(PredictionBatch::new(self.score(&features)?))
    }

    /// Score a normalized, schema-ordered table.
    ///
    /// Row counts returned by the classifier must equal the table height and
    /// labels must be 0 or 1; anything else is an inference error.
    pub fn score(&self, features: &DataFrame) -> Result<Vec<PredictionResult>> {
        let start = Instant::now();
        let n_rows = features.height();

        let labels = self.classifier.predict(features).map_err(|e| {
            error!(error = %e, rows = n_rows, "Classifier failed to produce labels");
            PipelineError::Inference(e.to_string())
        })?;
        check_rows("labels", labels.len(), n_rows)?;

        let labels = labels
            .into_iter()
            .map(|label| match label {
                0 => Ok(0u8),
                1 => Ok(1u8),
                other => Err(PipelineError::Inference(format!(
                    "classifier returned non-binary label {}",
                    other
                ))),
            })
            .collect::<Result<Vec<u8>>>()?;

        let probabilities = match self.classifier.predict_proba(features) {
            Some(Ok(probabilities)) => {
                check_rows("probabilities", probabilities.len(), n_rows)?;
                probabilities
            }
            Some(Err(e)) => {
                error!(error = %e, rows = n_rows, "Classifier failed to produce probabilities");
                return Err(PipelineError::Inference(e.to_string()));
            }
            // Hard 0/1 fallback when the model has no probability support
            None => labels
                .iter()
                .map(|&label| [1.0 - label as f64, label as f64])
                .collect(),
        };

        let results: Vec<PredictionResult> = labels
            .into_iter()
            .zip(probabilities)
            .map(|(label, proba)| PredictionResult::new(label, proba))
            .collect();

        debug!(
            rows = n_rows,
            positives = results.iter().filter(|r| r.label == 1).count(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Scored batch"
        );

        Ok(results)
    }
}

fn check_rows(what: &str, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        error!(what, actual, expected, "Classifier broke the row-count contract");
        return Err(PipelineError::Inference(format!(
            "classifier returned {} {} for {} rows",
            actual, what, expected
        )));
    }
    Ok(())
}
