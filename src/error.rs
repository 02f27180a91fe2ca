//! Error types for the heart disease inference pipeline

use serde::Serialize;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// A single rejected field on the strict single-record path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub constraint: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            constraint: constraint.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.constraint)
    }
}

/// Errors raised while turning a request into predictions
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Missing field or out-of-range value on the strict path
    #[error("Validation failed: {}", join_violations(.0))]
    Validation(Vec<FieldViolation>),

    #[error("No instances provided. Please provide at least one instance.")]
    EmptyBatch,

    #[error("Invalid input format. Could not convert to a table: {0}")]
    MalformedInput(String),

    /// Sorted names of the schema columns absent from the batch
    #[error("Missing required columns: {0:?}")]
    MissingColumns(Vec<String>),

    #[error("Model prediction failed: {0}")]
    Inference(String),

    #[error("Failed to load model: {0}")]
    Startup(String),
}

impl PipelineError {
    /// Stable identifier used in error response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validation_error",
            PipelineError::EmptyBatch => "empty_batch",
            PipelineError::MalformedInput(_) => "malformed_input",
            PipelineError::MissingColumns(_) => "missing_columns",
            PipelineError::Inference(_) => "inference_error",
            PipelineError::Startup(_) => "startup_error",
        }
    }

    /// Whether the caller caused the failure
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PipelineError::Inference(_) | PipelineError::Startup(_))
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
