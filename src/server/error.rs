//! Error types for the server

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::PipelineError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Invalid request body: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Pipeline(PipelineError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Pipeline(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({
            "error": true,
            "message": self.to_string(),
        });

        match &self {
            ServerError::Pipeline(e) => {
                body["kind"] = json!(e.kind());
                match e {
                    PipelineError::Validation(violations) => {
                        body["violations"] = json!(violations);
                    }
                    PipelineError::MissingColumns(columns) => {
                        body["missing_columns"] = json!(columns);
                    }
                    PipelineError::Inference(_) | PipelineError::Startup(_) => {
                        tracing::error!(detail = %e, "Prediction failed");
                    }
                    _ => {}
                }
            }
            ServerError::BadRequest(_) => body["kind"] = json!("bad_request"),
            ServerError::NotFound(_) => body["kind"] = json!("not_found"),
        }

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
