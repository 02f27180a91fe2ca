//! API route definitions

use std::sync::Arc;
use axum::{
    http::{HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use super::{error::ServerError, handlers, state::AppState};

async fn handle_404() -> ServerError {
    ServerError::NotFound("Visit / for the list of endpoints.".to_string())
}

async fn handle_405() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "error": true,
            "message": "Method not allowed. Prediction endpoints accept POST only.",
            "kind": "method_not_allowed",
        })),
    )
}

/// CORS configured via `CORS_ORIGIN` (default: allow all)
fn cors_layer() -> CorsLayer {
    let permissive = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    match std::env::var("CORS_ORIGIN") {
        Ok(origin) if !origin.is_empty() && origin != "*" => match origin.parse::<HeaderValue>() {
            Ok(value) => CorsLayer::new()
                .allow_origin(value)
                .allow_methods(Any)
                .allow_headers(Any),
            Err(_) => {
                warn!(origin = %origin, "Invalid CORS_ORIGIN, allowing all origins");
                permissive
            }
        },
        _ => permissive,
    }
}

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/schema", get(handlers::get_schema))
        .route("/predict", post(handlers::predict))
        .route("/predict/single", post(handlers::predict_single))
        .fallback(handle_404)
        .method_not_allowed_fallback(handle_405)
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}
