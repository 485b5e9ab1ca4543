//! # Application Error
//!
//! One domain error type (`ApiError`) covering every failure the API can
//! surface, each mapped to a distinct machine-readable code and HTTP status
//! and rendered through a single JSON envelope
//! (`{ "error": { "code": "<kind>", "message": "<text>" } }`).
//!
//! Grounded on `momentum-sez-stack/crates/msez-api/src/error.rs`
//! (thiserror enum + `IntoResponse` + JSON envelope) and
//! `KwaminaWhyte-rivetr/src/api/error.rs` (code strings, `From<sqlx::Error>`).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-level error type that maps to HTTP responses.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Authentication required or failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient permissions for the action.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// An identity (e.g. email) already exists.
    #[error("duplicate identity")]
    DuplicateIdentity,

    /// The actor already has a pending match request.
    #[error("duplicate pending request")]
    DuplicatePending,

    /// The target is not in a state that permits the requested transition.
    #[error("invalid state")]
    InvalidState,

    /// Infrastructure / unexpected failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status this error maps to.
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::DuplicateIdentity => StatusCode::BAD_REQUEST,
            ApiError::DuplicatePending => StatusCode::BAD_REQUEST,
            ApiError::InvalidState => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code slug for the error envelope.
    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::Validation(_) => "validation_error",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::DuplicateIdentity => "duplicate_identity",
            ApiError::DuplicatePending => "duplicate_pending",
            ApiError::InvalidState => "invalid_state",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        });
        (status, axum::Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e.to_string())
    }
}
