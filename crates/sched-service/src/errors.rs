//! Scheduler service error types.
//!
//! All errors map to appropriate HTTP status codes via the `IntoResponse`
//! impl. Database errors returned to clients are intentionally generic to
//! avoid leaking internal details; actual errors are logged server-side.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// Scheduler service error type.
///
/// Maps to HTTP status codes:
/// - Database, Internal: 500 Internal Server Error
/// - NotFound: 404 Not Found
/// - InvalidArgument: 400 Bad Request
/// - Conflict, DeleteRefused: 409 Conflict
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Delete refused by runtime monitor: {}", .0.join("; "))]
    DeleteRefused(Vec<String>),

    #[error("Internal server error")]
    Internal,
}

impl SchedulerError {
    /// Returns the HTTP status code for this error (for metrics recording).
    pub fn status_code(&self) -> u16 {
        match self {
            SchedulerError::Database(_) | SchedulerError::Internal => 500,
            SchedulerError::NotFound(_) => 404,
            SchedulerError::InvalidArgument(_) => 400,
            SchedulerError::Conflict(_) | SchedulerError::DeleteRefused(_) => 409,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    violations: Vec<String>,
}

impl IntoResponse for SchedulerError {
    fn into_response(self) -> Response {
        let (status, code, message, violations) = match &self {
            SchedulerError::Database(err) => {
                // Log actual error server-side, return generic message.
                tracing::error!(target: "sched.database", error = %err, "Database operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                    Vec::new(),
                )
            }
            SchedulerError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                resource.clone(),
                Vec::new(),
            ),
            SchedulerError::InvalidArgument(reason) => (
                StatusCode::BAD_REQUEST,
                "INVALID_ARGUMENT",
                reason.clone(),
                Vec::new(),
            ),
            SchedulerError::Conflict(reason) => (
                StatusCode::CONFLICT,
                "CONFLICT",
                reason.clone(),
                Vec::new(),
            ),
            SchedulerError::DeleteRefused(messages) => (
                StatusCode::CONFLICT,
                "DELETE_REFUSED",
                "Runtime monitor refused the deletion".to_string(),
                messages.clone(),
            ),
            SchedulerError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                Vec::new(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                violations,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<StoreError> for SchedulerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => SchedulerError::NotFound(what),
            StoreError::UniqueViolation(what) => SchedulerError::InvalidArgument(what),
            StoreError::Database(message) => SchedulerError::Database(message),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    // Helper function to read the response body as JSON
    async fn read_body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_display_database_error() {
        let error = SchedulerError::Database("connection failed".to_string());
        assert_eq!(format!("{}", error), "Database error: connection failed");
    }

    #[test]
    fn test_display_not_found() {
        let error = SchedulerError::NotFound("Meeting not found".to_string());
        assert_eq!(format!("{}", error), "Not found: Meeting not found");
    }

    #[test]
    fn test_display_delete_refused_joins_messages() {
        let error = SchedulerError::DeleteRefused(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            format!("{}", error),
            "Delete refused by runtime monitor: a; b"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            SchedulerError::Database("test".to_string()).status_code(),
            500
        );
        assert_eq!(
            SchedulerError::NotFound("test".to_string()).status_code(),
            404
        );
        assert_eq!(
            SchedulerError::InvalidArgument("test".to_string()).status_code(),
            400
        );
        assert_eq!(
            SchedulerError::Conflict("test".to_string()).status_code(),
            409
        );
        assert_eq!(SchedulerError::DeleteRefused(Vec::new()).status_code(), 409);
        assert_eq!(SchedulerError::Internal.status_code(), 500);
    }

    #[test]
    fn test_from_store_error() {
        let err: SchedulerError = StoreError::NotFound("Room not found".to_string()).into();
        assert!(matches!(err, SchedulerError::NotFound(_)));

        let err: SchedulerError =
            StoreError::UniqueViolation("Room name already in use".to_string()).into();
        assert!(matches!(err, SchedulerError::InvalidArgument(_)));

        let err: SchedulerError = StoreError::Database("boom".to_string()).into();
        assert!(matches!(err, SchedulerError::Database(_)));
    }

    #[tokio::test]
    async fn test_into_response_database_error() {
        let error = SchedulerError::Database("connection failed".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"]["code"], "DATABASE_ERROR");
        assert_eq!(
            body_json["error"]["message"],
            "An internal database error occurred"
        );
    }

    #[tokio::test]
    async fn test_into_response_not_found() {
        let error = SchedulerError::NotFound("Meeting not found".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"]["code"], "NOT_FOUND");
        assert_eq!(body_json["error"]["message"], "Meeting not found");
    }

    #[tokio::test]
    async fn test_into_response_invalid_argument() {
        let error = SchedulerError::InvalidArgument("Invalid status transition".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"]["code"], "INVALID_ARGUMENT");
    }

    #[tokio::test]
    async fn test_into_response_delete_refused_carries_violations() {
        let error = SchedulerError::DeleteRefused(vec!["overlap recorded".to_string()]);
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"]["code"], "DELETE_REFUSED");
        assert_eq!(body_json["error"]["violations"][0], "overlap recorded");
    }
}
