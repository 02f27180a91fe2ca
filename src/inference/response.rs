//! Prediction results and response assembly

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Human-readable diagnosis, driven only by the integer label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnosis {
    #[serde(rename = "Heart Disease Detected")]
    HeartDiseaseDetected,
    #[serde(rename = "No Heart Disease")]
    NoHeartDisease,
}

impl Diagnosis {
    pub fn from_label(label: u8) -> Self {
        if label == 1 {
            Diagnosis::HeartDiseaseDetected
        } else {
            Diagnosis::NoHeartDisease
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Diagnosis::HeartDiseaseDetected => "Heart Disease Detected",
            Diagnosis::NoHeartDisease => "No Heart Disease",
        }
    }
}

impl std::fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome for one input row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 0 = no heart disease, 1 = heart disease
    #[serde(rename = "prediction")]
    pub label: u8,
    /// `[p_no_disease, p_disease]`
    #[serde(rename = "probability")]
    pub probabilities: [f64; 2],
    pub diagnosis: Diagnosis,
}

impl PredictionResult {
    pub fn new(label: u8, probabilities: [f64; 2]) -> Self {
        Self {
            label,
            probabilities,
            diagnosis: Diagnosis::from_label(label),
        }
    }

    /// Probability of the positive class
    pub fn disease_risk(&self) -> f64 {
        self.probabilities[1]
    }
}

/// Ordered results for a batch request; `count` always equals the length
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionBatch {
    predictions: Vec<PredictionResult>,
    count: usize,
}

impl PredictionBatch {
    pub fn new(predictions: Vec<PredictionResult>) -> Self {
        let count = predictions.len();
        Self { predictions, count }
    }

    pub fn predictions(&self) -> &[PredictionResult] {
        &self.predictions
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn into_predictions(self) -> Vec<PredictionResult> {
        self.predictions
    }
}

/// Unwrap the only result of a single-record request
pub fn assemble_single(results: Vec<PredictionResult>) -> Result<PredictionResult> {
    let n = results.len();
    let mut iter = results.into_iter();
    match (iter.next(), n) {
        (Some(result), 1) => Ok(result),
        _ => Err(PipelineError::Inference(format!(
            "expected exactly one prediction, got {}",
            n
        ))),
    }
}
