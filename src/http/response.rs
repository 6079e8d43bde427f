//! Response handling and error mapping.
//!
//! # Responsibilities
//! - Map storage and validation outcomes to HTTP status codes, once
//! - Render error bodies as `{"error": ..., "status": ...}`
//! - Turn handler panics into the generic 500 body
//!
//! # Design Decisions
//! - Storage and unexpected failures never leak internal detail to clients;
//!   the detail is logged instead
//! - 4xx are logged at WARN, 5xx at ERROR

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::metrics;
use crate::store::StoreError;

pub const DATABASE_ERROR: &str = "Database error";
pub const UNEXPECTED_ERROR: &str = "Unexpected error";
pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// Errors a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// Unique key already taken.
    #[error("{0}")]
    Conflict(String),

    /// No matching row.
    #[error("{0}")]
    NotFound(String),

    /// Database-layer failure.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Anything else that went wrong while serving a known operation.
    #[error("unexpected failure: {0}")]
    Unexpected(String),

    /// Unhandled fault.
    #[error("unhandled fault: {0}")]
    Fault(String),
}

/// JSON error body.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub status: u16,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) | ApiError::Unexpected(_) | ApiError::Fault(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::Conflict(_) => "conflict",
            ApiError::NotFound(_) => "not_found",
            ApiError::Storage(_) => "storage",
            ApiError::Unexpected(_) => "unexpected",
            ApiError::Fault(_) => "fault",
        }
    }

    /// Message safe to show to clients.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Validation(msg) | ApiError::Conflict(msg) | ApiError::NotFound(msg) => {
                msg.clone()
            }
            ApiError::Storage(_) => DATABASE_ERROR.to_string(),
            ApiError::Unexpected(_) => UNEXPECTED_ERROR.to_string(),
            ApiError::Fault(_) => INTERNAL_SERVER_ERROR.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) => ApiError::Conflict(err.to_string()),
            StoreError::NotFound(_) => ApiError::NotFound(err.to_string()),
            StoreError::Database(e) => ApiError::Storage(e.to_string()),
            StoreError::Unexpected(detail) => ApiError::Unexpected(detail),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error.kind = self.kind(), error = %self, "Request failed");
        } else {
            tracing::warn!(error.kind = self.kind(), error = %self, "Request rejected");
        }
        metrics::record_error(self.kind());

        let body = ErrorBody {
            error: self.public_message(),
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

/// Response for a handler that panicked.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::Fault(detail).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Storage("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::Unexpected("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::Fault("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_store_errors_map_without_leaking_detail() {
        let err = ApiError::from(StoreError::Database(sqlx::Error::PoolTimedOut));
        assert!(matches!(err, ApiError::Storage(_)));
        assert_eq!(err.public_message(), "Database error");

        let err = ApiError::from(StoreError::Unexpected("row id 0".into()));
        assert_eq!(err.public_message(), "Unexpected error");

        let err = ApiError::from(StoreError::Duplicate("Dune".into()));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.public_message(), "Book with title 'Dune' already registered");

        let err = ApiError::from(StoreError::NotFound(3));
        assert_eq!(err.public_message(), "Book with ID 3 not found");
    }

    #[tokio::test]
    async fn test_error_body() {
        let response = ApiError::NotFound("Book with ID 3 not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            ErrorBody {
                error: "Book with ID 3 not found".into(),
                status: 404
            }
        );
    }

    #[test]
    fn test_panic_payloads() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = panic_response(Box::new(String::from("boom")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
