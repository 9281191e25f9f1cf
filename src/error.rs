//! Error codes and the JSON error response shared by all routes.
//!
//! DESIGN
//! ======
//! Domain errors stay as `thiserror` enums in their own modules. Each one
//! implements [`ErrorCode`] so the HTTP layer can render a stable code and a
//! retry hint without knowing the variant details. [`ApiError`] is the only
//! type route handlers return on failure.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Stable machine-readable code attached to every error the API returns.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// API ERROR
// =============================================================================

/// Error rendered as `{"error": ..., "code": ..., "retryable": ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub code: &'static str,
    pub retryable: bool,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self { status, message: message.into(), code, retryable: false }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, "E_BAD_REQUEST")
    }

    /// Build from a domain error, keeping its code and retry hint.
    #[must_use]
    pub fn from_code(status: StatusCode, message: impl Into<String>, err: &(impl ErrorCode + ?Sized)) -> Self {
        Self { status, message: message.into(), code: err.error_code(), retryable: err.retryable() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.message,
            "code": self.code,
            "retryable": self.retryable,
        });
        (self.status, Json(body)).into_response()
    }
}
