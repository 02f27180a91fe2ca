//! Fitted linear estimators

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Logistic regression for binary classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Fitted coefficients, one per feature
    pub coefficients: Vec<f64>,
    /// Fitted intercept
    #[serde(default)]
    pub intercept: f64,
}

impl LogisticRegression {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self { coefficients, intercept }
    }

    /// Sigmoid function
    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }

    pub fn decision_function(&self, x: &Array2<f64>) -> Array1<f64> {
        decision(x, &self.coefficients, self.intercept)
    }

    /// Class labels: positive decision value means class 1
    pub fn predict(&self, x: &Array2<f64>) -> Vec<i64> {
        self.decision_function(x)
            .iter()
            .map(|&d| if d > 0.0 { 1 } else { 0 })
            .collect()
    }

    /// `[p0, p1]` per row
    pub fn predict_proba(&self, x: &Array2<f64>) -> Vec<[f64; 2]> {
        Self::sigmoid(&self.decision_function(x))
            .iter()
            .map(|&p| [1.0 - p, p])
            .collect()
    }
}

/// Linear support vector classifier. Carries no probability calibration, so
/// callers fall back to hard 0/1 probabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSvc {
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

impl LinearSvc {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self { coefficients, intercept }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Vec<i64> {
        decision(x, &self.coefficients, self.intercept)
            .iter()
            .map(|&d| if d > 0.0 { 1 } else { 0 })
            .collect()
    }
}

fn decision(x: &Array2<f64>, coefficients: &[f64], intercept: f64) -> Array1<f64> {
    let weights = ArrayView1::from(coefficients);
    x.dot(&weights) + intercept
}
