use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::storage::StorageError;

/// Request-level errors surfaced to HTTP callers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No file provided")]
    MissingFile,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Upload exceeds the maximum allowed size")]
    PayloadTooLarge,

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => ApiError::NotFound(key),
            StorageError::InvalidKey(key) => ApiError::BadRequest(format!("invalid key: {}", key)),
            other => ApiError::Storage(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::MissingFile => (StatusCode::BAD_REQUEST, "NO_FILE"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code,
        };

        (status, Json(body)).into_response()
    }
}
