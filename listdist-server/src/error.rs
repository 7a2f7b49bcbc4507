//! Error types for listdist-server
//!
//! Every failure leaves the service as `{ "error": ..., "details": ... }`
//! with `details` omitted when there is nothing to add. Client mistakes map
//! to 4xx, anything else to 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::ingest::IngestError;

/// One rejected request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or rejected bearer credential (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Malformed request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Request body failed field validation (400)
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Upload pipeline failure; status depends on the variant
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// listdist-common error (conflicts, storage)
    #[error(transparent)]
    Common(#[from] listdist_common::Error),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, String, Option<Value>) {
        use listdist_common::Error as CommonError;

        match self {
            ApiError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized".to_string(),
                Some(json!(msg)),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            ApiError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                self.to_string(),
                Some(json!(fields)),
            ),
            ApiError::Ingest(err) => match err {
                IngestError::MissingFile | IngestError::NoValidData | IngestError::NoAgents => {
                    (StatusCode::BAD_REQUEST, err.to_string(), None)
                }
                IngestError::UnsupportedFormat(_) => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, err.to_string(), None)
                }
                IngestError::PayloadTooLarge { .. } => {
                    (StatusCode::PAYLOAD_TOO_LARGE, err.to_string(), None)
                }
                IngestError::Parse(inner) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "Failed to parse file".to_string(),
                    Some(json!(inner.to_string())),
                ),
                IngestError::Io(inner) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to process file".to_string(),
                    Some(json!(inner.to_string())),
                ),
                IngestError::Storage(inner) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                    Some(json!(inner.to_string())),
                ),
            },
            ApiError::Common(err) => match err {
                CommonError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone(), None),
                CommonError::Database(inner) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                    Some(json!(inner.to_string())),
                ),
                other => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".to_string(),
                    Some(json!(other.to_string())),
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = self.parts();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        }

        let body = match details {
            Some(details) => json!({ "error": error, "details": details }),
            None => json!({ "error": error }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
