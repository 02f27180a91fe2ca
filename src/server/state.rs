//! Application state management

use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::inference::InferenceEngine;
use crate::model::ModelArtifact;
use crate::schema::FeatureSchema;

use super::health::{DatabaseProbe, EnvDatabaseProbe};
use super::ServerConfig;

/// Read-only state shared across handlers, built once at startup
pub struct AppState {
    pub config: ServerConfig,
    pub engine: InferenceEngine,
    pub db_probe: Arc<dyn DatabaseProbe>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: ServerConfig, engine: InferenceEngine, db_probe: Arc<dyn DatabaseProbe>) -> Self {
        Self {
            config,
            engine,
            db_probe,
            started_at: chrono::Utc::now(),
        }
    }

    /// Load the schema and model artifact named by the config.
    ///
    /// Fails with a startup error when the artifact is missing or unusable.
    pub fn load(config: ServerConfig) -> Result<Self> {
        let schema = Arc::new(FeatureSchema::heart_disease());
        let artifact = ModelArtifact::load(&config.model_path, &schema)?;
        let engine = InferenceEngine::new(schema, Arc::new(artifact));
        let db_probe = Arc::new(EnvDatabaseProbe::new(config.database_url.clone()));
        Ok(Self::new(config, engine, db_probe))
    }

    /// Short id used to correlate log lines of one request
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()[..8].to_string()
    }
}
