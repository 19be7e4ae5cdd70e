/// Unified error types for the user directory
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::user_store::UserId;

/// Main error type for the directory service
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// The backing file exists but could not be parsed
    #[error("Backing store is corrupt: {0}")]
    StorageCorrupt(String),

    /// Directory creation, file write, listing or deletion failed
    #[error("Filesystem error: {0}")]
    Filesystem(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The record set could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Uploaded file exceeds the configured limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Conflict errors (e.g., overlapping uploads)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The record mutation committed but stale avatar files survived
    #[error("User {user_id} was saved but stale avatar files could not be removed: {reason}")]
    AvatarCleanup { user_id: UserId, reason: String },

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert DirectoryError to HTTP response
impl IntoResponse for DirectoryError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            DirectoryError::Validation(ref msg) => {
                (StatusCode::BAD_REQUEST, "InvalidRequest", msg.clone())
            }
            DirectoryError::NotFound(ref msg) => (StatusCode::NOT_FOUND, "NotFound", msg.clone()),
            DirectoryError::Conflict(ref msg) => (StatusCode::CONFLICT, "Conflict", msg.clone()),
            DirectoryError::PayloadTooLarge(ref msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PayloadTooLarge", msg.clone())
            }
            DirectoryError::AvatarCleanup { user_id, ref reason } => {
                tracing::error!(user_id, reason = %reason, "avatar cleanup failed after upsert");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "AvatarCleanupFailed",
                    format!(
                        "user {} was saved but stale avatar files could not be removed",
                        user_id
                    ),
                )
            }
            DirectoryError::StorageCorrupt(_)
            | DirectoryError::Filesystem(_)
            | DirectoryError::Io(_)
            | DirectoryError::Serialization(_)
            | DirectoryError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalServerError",
                    "Internal issue".to_string(), // Don't leak details
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for directory operations
pub type DirectoryResult<T> = Result<T, DirectoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = vec![
            (DirectoryError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (DirectoryError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (DirectoryError::Conflict("x".into()), StatusCode::CONFLICT),
            (DirectoryError::PayloadTooLarge("x".into()), StatusCode::PAYLOAD_TOO_LARGE),
            (DirectoryError::StorageCorrupt("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                DirectoryError::AvatarCleanup { user_id: 3, reason: "x".into() },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: DirectoryError = io.into();
        assert!(matches!(err, DirectoryError::Io(_)));
    }
}
