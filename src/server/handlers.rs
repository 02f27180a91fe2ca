//! HTTP request handlers

use std::sync::Arc;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::inference::{PredictionBatch, PredictionResult};

use super::error::{Result, ServerError};
use super::health::DatabaseInfo;
use super::state::AppState;

pub const SERVICE_NAME: &str = "Heart Disease Classification API";

// ============================================================================
// Metadata Handlers
// ============================================================================

pub async fn root() -> Json<Value> {
    Json(serde_json::json!({
        "name": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Predicts presence of heart disease based on patient features",
        "endpoints": {
            "health": "/health",
            "schema": "/schema",
            "predict": "/predict",
            "predict_single": "/predict/single",
        },
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub model_path: String,
    pub database_type: String,
    pub database_location: String,
}

/// Never fails: a probe error degrades the status instead
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let (status, database) = match state.db_probe.describe() {
        Ok(info) => ("healthy", info),
        Err(e) => {
            warn!(error = %e, "Database probe failed, reporting placeholders");
            ("degraded", DatabaseInfo::unknown())
        }
    };

    Json(HealthResponse {
        status,
        model_loaded: true,
        model_path: state.config.model_path.display().to_string(),
        database_type: database.kind,
        database_location: database.location,
    })
}

pub async fn get_schema(State(state): State<Arc<AppState>>) -> Json<Value> {
    let schema = state.engine.schema();
    Json(serde_json::json!({
        "features": schema.iter().collect::<Vec<_>>(),
        "count": schema.len(),
        "model": state.engine.classifier().describe(),
    }))
}

// ============================================================================
// Prediction Handlers
// ============================================================================

/// Batch prediction: `{"instances": [{...}, ...]}`
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionBatch>> {
    let request_id = AppState::generate_id();
    let Json(body) = payload.map_err(|e| reject(&request_id, e.into()))?;

    let instances = body
        .get("instances")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            PipelineError::MalformedInput("request body must contain an 'instances' list".to_string())
        })
        .map_err(|e| reject(&request_id, e.into()))?;

    info!(request_id = %request_id, instances = instances.len(), "Batch prediction request");

    let batch = state
        .engine
        .predict_batch(instances)
        .map_err(|e| reject(&request_id, e.into()))?;

    info!(request_id = %request_id, count = batch.count(), "Batch prediction complete");
    Ok(Json(batch))
}

/// Single prediction with per-field validation
pub async fn predict_single(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResult>> {
    let request_id = AppState::generate_id();
    let Json(record) = payload.map_err(|e| reject(&request_id, e.into()))?;

    let result = state
        .engine
        .predict_single(&record)
        .map_err(|e| reject(&request_id, e.into()))?;

    info!(
        request_id = %request_id,
        prediction = result.label,
        risk = result.disease_risk(),
        "Single prediction complete"
    );
    Ok(Json(result))
}

fn reject(request_id: &str, err: ServerError) -> ServerError {
    if err.status().is_client_error() {
        warn!(request_id = %request_id, status = err.status().as_u16(), error = %err, "Rejected prediction request");
    }
    err
}
