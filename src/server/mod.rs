//! Heart Disease API Server Module
//!
//! Stateless HTTP service around the loaded classifier: batch and
//! single-record prediction, schema introspection and health reporting.

mod api;
mod error;
mod handlers;
mod health;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use handlers::{HealthResponse, SERVICE_NAME};
pub use health::{DatabaseInfo, DatabaseProbe, EnvDatabaseProbe};
pub use state::AppState;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_MODEL_PATH: &str = "models/heart_disease_model.json";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    pub database_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            model_path: std::env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_MODEL_PATH)),
            database_url: std::env::var("DATABASE_URL").ok(),
        }
    }
}

/// Start the server with the given configuration.
///
/// The model is loaded before binding; a missing or invalid artifact aborts
/// startup instead of serving requests that would all fail.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();
    info!(
        model_path = %config.model_path.display(),
        started_at = %start_time.to_rfc3339(),
        "Loading model artifact"
    );

    let state = Arc::new(AppState::load(config.clone())?);
    info!(model = %state.engine.classifier().describe(), "Model ready");

    if let Err(e) = state.db_probe.describe() {
        warn!(error = %e, "DATABASE_URL could not be interpreted, health will report degraded");
    }

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        host = %config.host,
        port = config.port,
        address = %addr,
        "{} starting", SERVICE_NAME
    );
    info!(url = %format!("http://{}/predict", addr), "Batch prediction endpoint available");
    info!(url = %format!("http://{}/health", addr), "Health endpoint available");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening and ready to accept connections");

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl+c, shutdown signal disabled");
            std::future::pending::<()>().await;
        }
        let stop_time = chrono::Utc::now();
        let uptime = stop_time.signed_duration_since(start_time);
        info!(
            stopped_at = %stop_time.to_rfc3339(),
            uptime_secs = uptime.num_seconds(),
            "Shutdown signal received, stopping server gracefully"
        );
    };

    info!("Server started successfully (press ctrl+c to stop)");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}
