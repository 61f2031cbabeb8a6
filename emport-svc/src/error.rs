//! Error types for emport-svc
//!
//! Import structural errors and the already-running refusal are ordinary
//! responses with their own codes; per-item outcomes never reach this type,
//! they are reported through the status endpoint.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::{ExportError, StartImportError};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Import text is not valid JSON (400)
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Import document has the wrong top-level shape (400)
    #[error("Invalid import data: {0}")]
    InvalidImportData(String),

    /// Conflict (409) - import already running for this owner
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Export could not be produced (500)
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl From<StartImportError> for ApiError {
    fn from(err: StartImportError) -> Self {
        match err {
            StartImportError::Parse(msg) => ApiError::ParseError(msg),
            StartImportError::InvalidImportData(msg) => ApiError::InvalidImportData(msg),
            StartImportError::AlreadyRunning(e) => ApiError::Conflict(e.to_string()),
            no_runtime @ StartImportError::NoRuntime => ApiError::Internal(no_runtime.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::ParseError(msg) => (StatusCode::BAD_REQUEST, "PARSE_ERROR", msg),
            ApiError::InvalidImportData(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_IMPORT_DATA", msg)
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "IMPORT_RUNNING", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Export(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "EXPORT_FAILED",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
