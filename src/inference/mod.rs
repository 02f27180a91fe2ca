//! Inference engine module
//!
//! Provides the request pipeline around the loaded classifier:
//! - Batch and single-record entry points
//! - Row-count and label contract checks on the classifier output
//! - Hard 0/1 probability fallback for models without `predict_proba`
//! - Label-driven diagnosis strings
//! - Batch/single response shapes

mod engine;
mod response;

pub use engine::InferenceEngine;
pub use response::{assemble_single, Diagnosis, PredictionBatch, PredictionResult};
