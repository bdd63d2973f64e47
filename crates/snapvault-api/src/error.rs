//! API error types and JSON error response formatting.
//!
//! Every failing JSON endpoint answers with `{success: false, error, details?}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use snapvault_core::error::SnapvaultError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    /// Short human-readable message.
    pub error: String,
    /// Underlying error text, for operator debugging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - malformed body or missing required field.
    BadRequest(String),
    /// 405 Method Not Allowed.
    MethodNotAllowed,
    /// 500 - the storage backend rejected or could not serve the call.
    Storage { message: String, details: String },
    /// 500 Internal Server Error - anything else.
    Internal(String),
}

impl ApiError {
    /// Storage failure with a caller-facing `message`; the error text goes in `details`.
    pub fn storage(message: &str, err: SnapvaultError) -> Self {
        let details = match err {
            SnapvaultError::StorageUnavailable(details) => details,
            other => other.to_string(),
        };
        ApiError::Storage {
            message: message.to_string(),
            details,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Storage { .. } | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, details) = match self {
            ApiError::BadRequest(msg) => (msg, None),
            ApiError::MethodNotAllowed => ("Method not allowed".to_string(), None),
            ApiError::Storage { message, details } => (message, Some(details)),
            ApiError::Internal(msg) => (msg, None),
        };

        let body = ErrorBody {
            success: false,
            error,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<SnapvaultError> for ApiError {
    fn from(err: SnapvaultError) -> Self {
        match err {
            SnapvaultError::Validation(msg) => ApiError::BadRequest(msg),
            SnapvaultError::StorageUnavailable(details) => ApiError::Storage {
                message: "Storage unavailable".to_string(),
                details,
            },
            other => ApiError::Internal(other.to_string()),
        }
    }
}
