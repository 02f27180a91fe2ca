//! Feature schema
//!
//! The ordered list of input features the classifier was fitted on, with the
//! range each field must satisfy on the strict single-record path. The order
//! is the column order handed to the model.

use serde::Serialize;
use std::collections::HashSet;

use crate::error::{PipelineError, Result};

/// Value kind accepted for a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    /// Whole numbers only (categorical codes, counts, mm Hg, ...)
    Integer,
    /// Any finite number
    Real,
}

/// One feature with its inclusive bounds
#[derive(Debug, Clone, Serialize)]
pub struct FeatureSpec {
    pub name: String,
    pub kind: FeatureKind,
    pub min: f64,
    pub max: f64,
    pub description: String,
}

impl FeatureSpec {
    pub fn integer(name: &str, min: i64, max: i64, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FeatureKind::Integer,
            min: min as f64,
            max: max as f64,
            description: description.to_string(),
        }
    }

    pub fn real(name: &str, min: f64, max: f64, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FeatureKind::Real,
            min,
            max,
            description: description.to_string(),
        }
    }

    /// Render a bound the way the field is typed (`120`, not `120.0`)
    pub fn format_bound(&self, bound: f64) -> String {
        match self.kind {
            FeatureKind::Integer => format!("{}", bound as i64),
            FeatureKind::Real => format!("{:?}", bound),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Ordered, immutable feature list
#[derive(Debug, Clone, Serialize)]
pub struct FeatureSchema {
    features: Vec<FeatureSpec>,
}

impl FeatureSchema {
    /// Build a schema, rejecting duplicate names and inverted bounds
    pub fn new(features: Vec<FeatureSpec>) -> Result<Self> {
        let mut seen = HashSet::new();
        for spec in &features {
            if !seen.insert(spec.name.as_str()) {
                return Err(PipelineError::Startup(format!(
                    "duplicate feature name in schema: {}",
                    spec.name
                )));
            }
            if spec.min > spec.max {
                return Err(PipelineError::Startup(format!(
                    "feature {} has min {} above max {}",
                    spec.name, spec.min, spec.max
                )));
            }
        }
        Ok(Self { features })
    }

    /// The 13-feature heart disease schema
    pub fn heart_disease() -> Self {
        Self {
            features: vec![
                FeatureSpec::integer("age", 1, 120, "Age in years"),
                FeatureSpec::integer("sex", 0, 1, "Sex (0=female, 1=male)"),
                FeatureSpec::integer("cp", 0, 3, "Chest pain type (0-3)"),
                FeatureSpec::integer("trestbps", 50, 250, "Resting blood pressure (mm Hg)"),
                FeatureSpec::integer("chol", 100, 600, "Serum cholesterol (mg/dl)"),
                FeatureSpec::integer("fbs", 0, 1, "Fasting blood sugar > 120 mg/dl (0=false, 1=true)"),
                FeatureSpec::integer("restecg", 0, 2, "Resting ECG results (0-2)"),
                FeatureSpec::integer("thalach", 50, 250, "Maximum heart rate achieved"),
                FeatureSpec::integer("exang", 0, 1, "Exercise induced angina (0=no, 1=yes)"),
                FeatureSpec::real("oldpeak", 0.0, 10.0, "ST depression induced by exercise"),
                FeatureSpec::integer("slope", 0, 2, "Slope of peak exercise ST segment (0-2)"),
                FeatureSpec::integer("ca", 0, 4, "Number of major vessels colored by fluoroscopy (0-4)"),
                FeatureSpec::integer("thal", 0, 3, "Thalassemia (0-3)"),
            ],
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureSpec> {
        self.features.iter()
    }

    pub fn get(&self, name: &str) -> Option<&FeatureSpec> {
        self.features.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::heart_disease()
    }
}
