//! Heart Disease API - binary heart disease classification service
//!
//! This crate wraps a pre-trained classifier behind a small prediction
//! pipeline:
//! - Strict validation of single patient records against feature ranges
//! - Loose batch ingestion of record lists into a feature table
//! - Scoring through any [`model::Classifier`], with probabilities when the
//!   model provides them and a hard 0/1 fallback when it does not
//! - HTTP server and CLI interfaces
//!
//! # Modules
//!
//! - [`schema`] - The 13 clinical features, their order and ranges
//! - [`preprocessing`] - Request normalization (single record and batch)
//! - [`model`] - Scoring capability and the serialized model artifact
//! - [`inference`] - Inference engine and response types
//! - [`server`] - HTTP server with REST API
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Prediction pipeline
pub mod schema;
pub mod preprocessing;
pub mod model;
pub mod inference;

// Services
pub mod server;
pub mod cli;

pub use error::{PipelineError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{FieldViolation, PipelineError, Result};

    // Schema
    pub use crate::schema::{FeatureKind, FeatureSchema, FeatureSpec};

    // Preprocessing
    pub use crate::preprocessing::{normalize_batch, normalize_record, project_to_schema};

    // Models
    pub use crate::model::{Classifier, ClassifierMut, ModelArtifact, ModelError, Serialized};

    // Inference
    pub use crate::inference::{Diagnosis, InferenceEngine, PredictionBatch, PredictionResult};

    // Server
    pub use crate::server::{create_router, AppState, ServerConfig};
}
