//! Application error type mapping to HTTP status codes and envelope format.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use chatloom_types::error::SessionError;
use chatloom_types::llm::LlmError;

use super::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Errors surfaced by a session turn.
    Session(SessionError),
    NotFound(String),
    Validation(String),
    Internal(String),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        AppError::Session(e)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Session(SessionError::UnknownMode(tag)) => (
                StatusCode::BAD_REQUEST,
                "UNKNOWN_MODE",
                format!("Unknown chat mode '{tag}'"),
            ),
            AppError::Session(SessionError::ThreadNotFound(id)) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Thread '{id}' not found"),
            ),
            AppError::Session(SessionError::Generation(LlmError::Timeout { .. })) => (
                StatusCode::GATEWAY_TIMEOUT,
                "GENERATION_TIMEOUT",
                "Generation timed out, please retry".to_string(),
            ),
            AppError::Session(SessionError::Generation(e)) => (
                StatusCode::BAD_GATEWAY,
                "GENERATION_FAILED",
                format!("Generation failed, please retry ({e})"),
            ),
            AppError::Session(SessionError::Checkpoint(e)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CHECKPOINT_ERROR",
                e.to_string(),
            ),
            AppError::Session(SessionError::Flow(e)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "FLOW_ERROR", e.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, %message, "Request failed");
        }
        (status, Json(ApiResponse::error(code, &message))).into_response()
    }
}
