//! HTTP handlers and the API error surface.

pub mod notes;

pub use notes::{create_note, get_note};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use noteshare_core::CoreError;
use serde::Serialize;
use tracing::error;

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// API error types
#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    PayloadTooLarge { limit: usize },
    RateLimited,
    NotFound(String),
    Gone(String),
    Internal(CoreError),
}

impl ApiError {
    /// Failure description recorded into the audit log. Unlike the HTTP
    /// body, this keeps internal error detail for operators.
    pub fn audit_description(&self) -> String {
        match self {
            ApiError::Validation(msg) => msg.clone(),
            ApiError::PayloadTooLarge { limit } => {
                format!("payload exceeds limit of {limit} bytes")
            }
            ApiError::RateLimited => "rate limited".to_string(),
            ApiError::NotFound(id) => format!("note `{id}` not found"),
            ApiError::Gone(id) => format!("note `{id}` gone: purged after expiry"),
            ApiError::Internal(err) => err.to_string(),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { id } => ApiError::NotFound(id),
            CoreError::Gone { id } => ApiError::Gone(id),
            CoreError::Validation(msg) => ApiError::Validation(msg),
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::PayloadTooLarge { limit } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("payload exceeds limit of {limit} bytes"),
            ),
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "too many requests".to_string(),
            ),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "note not found".to_string()),
            ApiError::Gone(_) => (StatusCode::GONE, "note expired".to_string()),
            ApiError::Internal(err) => {
                // Log the detail, return a generic body: storage internals
                // never reach the client.
                error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_api_variants() {
        assert!(matches!(
            ApiError::from(CoreError::not_found("abc")),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(CoreError::gone("abc")),
            ApiError::Gone(_)
        ));
        assert!(matches!(
            ApiError::from(CoreError::storage("disk on fire")),
            ApiError::Internal(_)
        ));
        assert!(matches!(
            ApiError::from(CoreError::IdentifierExhausted { attempts: 8 }),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn internal_body_never_leaks_detail() {
        let response = ApiError::Internal(CoreError::storage("s3 bucket acl denied")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn audit_description_distinguishes_gone_from_not_found() {
        let gone = ApiError::Gone("abc".into()).audit_description();
        let missing = ApiError::NotFound("abc".into()).audit_description();
        assert!(gone.contains("purged"));
        assert!(!missing.contains("purged"));
        assert_ne!(gone, missing);
    }
}
