//! Serialized model pipeline
//!
//! A JSON document holding everything fitted offline: the feature order,
//! optional median imputation, optional standard scaling and the estimator.

use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use super::{Classifier, DecisionTree, LinearSvc, LogisticRegression, ModelError, RandomForest};
use crate::error::{PipelineError, Result};
use crate::schema::FeatureSchema;

/// Replaces nulls with per-feature statistics (training medians)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedianImputer {
    pub statistics: Vec<f64>,
}

/// `(x - mean) / scale`; a zero scale leaves the centered value unscaled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Final estimator of the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Estimator {
    LogisticRegression(LogisticRegression),
    LinearSvc(LinearSvc),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
}

impl Estimator {
    pub fn kind(&self) -> &'static str {
        match self {
            Estimator::LogisticRegression(_) => "logistic_regression",
            Estimator::LinearSvc(_) => "linear_svc",
            Estimator::DecisionTree(_) => "decision_tree",
            Estimator::RandomForest(_) => "random_forest",
        }
    }

    pub fn supports_proba(&self) -> bool {
        !matches!(self, Estimator::LinearSvc(_))
    }

    fn predict(&self, x: &Array2<f64>) -> Vec<i64> {
        match self {
            Estimator::LogisticRegression(m) => m.predict(x),
            Estimator::LinearSvc(m) => m.predict(x),
            Estimator::DecisionTree(m) => m.predict(x),
            Estimator::RandomForest(m) => m.predict(x),
        }
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Option<Vec<[f64; 2]>> {
        match self {
            Estimator::LogisticRegression(m) => Some(m.predict_proba(x)),
            Estimator::LinearSvc(_) => None,
            Estimator::DecisionTree(m) => Some(m.predict_proba(x)),
            Estimator::RandomForest(m) => Some(m.predict_proba(x)),
        }
    }

    fn validate(&self, n_features: usize) -> std::result::Result<(), String> {
        match self {
            Estimator::LogisticRegression(LogisticRegression { coefficients, .. })
            | Estimator::LinearSvc(LinearSvc { coefficients, .. }) => {
                check_len("coefficients", coefficients.len(), n_features)
            }
            Estimator::DecisionTree(m) => m.root.validate(n_features),
            Estimator::RandomForest(m) => {
                if m.trees.is_empty() {
                    return Err("random forest has no trees".to_string());
                }
                m.trees.iter().try_for_each(|tree| tree.validate(n_features))
            }
        }
    }
}

/// Fitted classification pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    #[serde(default)]
    pub version: String,
    /// Column order the estimator was fitted on
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub imputer: Option<MedianImputer>,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
    pub estimator: Estimator,
}

impl ModelArtifact {
    /// Load and check an artifact against the feature schema.
    ///
    /// Every failure is a `Startup` error: the service must not come up
    /// without a usable model.
    pub fn load(path: impl AsRef<Path>, schema: &FeatureSchema) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::Startup(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        let raw = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Startup(format!("could not read {}: {}", path.display(), e))
        })?;
        let artifact: ModelArtifact = serde_json::from_str(&raw).map_err(|e| {
            PipelineError::Startup(format!("could not deserialize {}: {}", path.display(), e))
        })?;
        artifact.validate(schema)?;

        info!(
            path = %path.display(),
            name = %artifact.name,
            version = %artifact.version,
            estimator = artifact.estimator.kind(),
            probabilities = artifact.estimator.supports_proba(),
            "Model loaded"
        );

        Ok(artifact)
    }

    /// Save as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Check feature order against the schema and parameter shapes against
    /// the feature count
    pub fn validate(&self, schema: &FeatureSchema) -> Result<()> {
        if self.feature_names.iter().map(String::as_str).ne(schema.names()) {
            return Err(PipelineError::Startup(format!(
                "model features {:?} do not match schema {:?}",
                self.feature_names,
                schema.names()
            )));
        }

        let n = self.feature_names.len();
        let mut checks = Vec::new();
        if let Some(imputer) = &self.imputer {
            checks.push(check_len("imputer statistics", imputer.statistics.len(), n));
        }
        if let Some(scaler) = &self.scaler {
            checks.push(check_len("scaler mean", scaler.mean.len(), n));
            checks.push(check_len("scaler scale", scaler.scale.len(), n));
        }
        checks.push(self.estimator.validate(n));

        checks
            .into_iter()
            .collect::<std::result::Result<(), String>>()
            .map_err(PipelineError::Startup)
    }

    /// Extract, impute and scale the feature matrix
    fn transform(&self, features: &DataFrame) -> std::result::Result<Array2<f64>, ModelError> {
        let mut x = feature_matrix(features, &self.feature_names)?;

        for (j, name) in self.feature_names.iter().enumerate() {
            let mut column = x.column_mut(j);
            for (i, value) in column.iter_mut().enumerate() {
                if value.is_nan() {
                    match &self.imputer {
                        Some(imputer) => *value = imputer.statistics[j],
                        None => {
                            return Err(ModelError::MissingValue {
                                column: name.clone(),
                                row: i,
                            })
                        }
                    }
                }
            }
            if let Some(scaler) = &self.scaler {
                let scale = if scaler.scale[j] == 0.0 { 1.0 } else { scaler.scale[j] };
                column.mapv_inplace(|v| (v - scaler.mean[j]) / scale);
            }
        }

        Ok(x)
    }
}

impl Classifier for ModelArtifact {
    fn predict(&self, features: &DataFrame) -> std::result::Result<Vec<i64>, ModelError> {
        let x = self.transform(features)?;
        Ok(self.estimator.predict(&x))
    }

    fn predict_proba(
        &self,
        features: &DataFrame,
    ) -> Option<std::result::Result<Vec<[f64; 2]>, ModelError>> {
        if !self.estimator.supports_proba() {
            return None;
        }
        Some(
            self.transform(features)
                .map(|x| self.estimator.predict_proba(&x).unwrap_or_default()),
        )
    }

    fn describe(&self) -> String {
        format!("{} v{} ({})", self.name, self.version, self.estimator.kind())
    }
}

fn check_len(what: &str, actual: usize, expected: usize) -> std::result::Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("{} has length {}, expected {}", what, actual, expected))
    }
}

/// Read the named columns as a dense `f64` matrix, nulls as NaN.
///
/// Columns are strict-cast, so text that does not parse as a number is a
/// type mismatch rather than a silent null.
pub(crate) fn feature_matrix(
    features: &DataFrame,
    names: &[String],
) -> std::result::Result<Array2<f64>, ModelError> {
    let mut x = Array2::<f64>::zeros((features.height(), names.len()));

    for (j, name) in names.iter().enumerate() {
        let column = features
            .column(name)
            .map_err(|_| ModelError::FeatureNotFound(name.clone()))?;
        let numeric = column
            .as_materialized_series()
            .strict_cast(&DataType::Float64)
            .map_err(|e| ModelError::TypeMismatch {
                column: name.clone(),
                detail: e.to_string(),
            })?;
        for (i, value) in numeric.f64()?.into_iter().enumerate() {
            x[[i, j]] = value.unwrap_or(f64::NAN);
        }
    }

    Ok(x)
}
