//! Scoring capability
//!
//! The classifier is a black box behind the [`Classifier`] trait: one
//! required label operation and one optional probability operation. Any
//! fitted model satisfying that contract can be plugged into the inference
//! engine.
//!
//! - [`ModelArtifact`] - the serialized pipeline loaded once at startup
//!   (median imputation, standard scaling, estimator)
//! - [`Serialized`] - mutex adapter for scorers that mutate state per call

mod artifact;
mod linear;
mod tree;

pub use artifact::{Estimator, MedianImputer, ModelArtifact, StandardScaler};
pub use linear::{LinearSvc, LogisticRegression};
pub use tree::{DecisionTree, RandomForest, TreeNode};

use parking_lot::Mutex;
use polars::prelude::*;
use thiserror::Error;

/// Failures raised by a classifier while scoring a table
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("column '{column}' could not be read as numbers: {detail}")]
    TypeMismatch { column: String, detail: String },

    #[error("missing value in column '{column}' at row {row}")]
    MissingValue { column: String, row: usize },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Data error: {0}")]
    Data(#[from] PolarsError),
}

/// A fitted binary classifier, safe for concurrent read-only use.
///
/// Both operations receive the full schema-ordered table and must return one
/// entry per row, in row order.
pub trait Classifier: Send + Sync {
    /// One class label per row
    fn predict(&self, features: &DataFrame) -> Result<Vec<i64>, ModelError>;

    /// One `[p0, p1]` pair per row, or `None` when the model has no native
    /// probability support
    fn predict_proba(&self, _features: &DataFrame) -> Option<Result<Vec<[f64; 2]>, ModelError>> {
        None
    }

    /// Short human-readable model description for logs and metadata
    fn describe(&self) -> String {
        "classifier".to_string()
    }
}

/// A classifier that needs exclusive access while scoring (scratch buffers,
/// lazily built caches, foreign handles that are not thread-safe).
pub trait ClassifierMut: Send {
    fn predict(&mut self, features: &DataFrame) -> Result<Vec<i64>, ModelError>;

    fn predict_proba(&mut self, _features: &DataFrame) -> Option<Result<Vec<[f64; 2]>, ModelError>> {
        None
    }

    fn describe(&self) -> String {
        "classifier".to_string()
    }
}

/// Shares a [`ClassifierMut`] across requests by serializing every call
/// through a mutex.
pub struct Serialized<C> {
    inner: Mutex<C>,
}

impl<C: ClassifierMut> Serialized<C> {
    pub fn new(classifier: C) -> Self {
        Self {
            inner: Mutex::new(classifier),
        }
    }

    pub fn into_inner(self) -> C {
        self.inner.into_inner()
    }
}

impl<C: ClassifierMut> Classifier for Serialized<C> {
    fn predict(&self, features: &DataFrame) -> Result<Vec<i64>, ModelError> {
        self.inner.lock().predict(features)
    }

    fn predict_proba(&self, features: &DataFrame) -> Option<Result<Vec<[f64; 2]>, ModelError>> {
        self.inner.lock().predict_proba(features)
    }

    fn describe(&self) -> String {
        format!("serialized({})", self.inner.lock().describe())
    }
}
