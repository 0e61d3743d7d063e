use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::foundation::error::ComposerError;

/// Error body `{"error": "..."}` with a status code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    /// Client errors keep their message; anything else becomes a 500 with `generic`.
    pub fn from_composer(err: ComposerError, generic: &str) -> Self {
        if err.is_client_error() {
            Self::bad_request(err.to_string())
        } else {
            tracing::error!(error = %err, context = generic, "request failed");
            Self::internal(generic)
        }
    }
}

impl From<ComposerError> for ApiError {
    fn from(err: ComposerError) -> Self {
        Self::from_composer(err, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/server/error.rs"]
mod tests;
