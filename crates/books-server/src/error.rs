//! API error types with JSON responses.
//!
//! Every failure becomes `{"error": "<message>"}`. Store failures are always
//! 500; the message is the store's own when it is a recognised storage error
//! and a fixed per-operation message otherwise.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use books_store::StoreError;
use serde::Serialize;

/// Message returned with every 404.
pub const BOOK_NOT_FOUND: &str = "Book not found";

/// The book operation a handler was performing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    List,
    Read,
    Update,
    Delete,
}

impl Operation {
    /// Generic message used when a failure is not a recognised storage error.
    pub const fn fallback_message(self) -> &'static str {
        match self {
            Self::Create => "An error occurred while creating the book.",
            Self::List => "An error occurred while retrieving the list of books.",
            Self::Read => "An error occurred while retrieving book details.",
            Self::Update => "An error occurred while updating book details.",
            Self::Delete => "An error occurred while deleting the book.",
        }
    }
}

/// API error that can be returned from handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request (400). Only produced for unreadable request bodies.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Store error (500).
    #[error("{operation:?} failed: {source}")]
    Store {
        operation: Operation,
        #[source]
        source: StoreError,
    },
}

impl ApiError {
    /// The 404 for a book id that matches nothing.
    pub fn book_not_found() -> Self {
        Self::NotFound(BOOK_NOT_FOUND.to_string())
    }

    /// Returns a `map_err` adapter that logs a store failure and tags it
    /// with the operation being performed.
    pub fn store(operation: Operation) -> impl FnOnce(StoreError) -> Self {
        move |source| {
            tracing::error!(?operation, error = %source, "Book store operation failed");
            Self::Store { operation, source }
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the response body.
    pub fn message(&self) -> String {
        match self {
            Self::BadRequest(message) | Self::NotFound(message) => message.clone(),
            Self::Store { operation, source } => recognized_message(source)
                .unwrap_or_else(|| operation.fallback_message().to_string()),
        }
    }
}

/// The client-facing message for storage errors we recognise, `None` for
/// transport, pool and other internal failures.
fn recognized_message(err: &StoreError) -> Option<String> {
    match err {
        StoreError::Validation(_)
        | StoreError::InvalidIdentifier(_)
        | StoreError::InvalidQuery(_) => Some(err.to_string()),
        StoreError::Database(sqlx::Error::Database(db)) => Some(db.message().to_string()),
        StoreError::Database(_) | StoreError::MigrationError(_) => None,
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.message(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use books_core::NewBook;

    #[test]
    fn test_not_found_is_404_with_fixed_message() {
        let err = ApiError::book_not_found();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "Book not found");
    }

    #[test]
    fn test_invalid_identifier_is_500() {
        let err = ApiError::store(Operation::Read)(StoreError::InvalidIdentifier("x".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Id not valid");
    }

    #[test]
    fn test_validation_message_passes_through() {
        let validation = NewBook::default().validate().unwrap_err();
        let err = ApiError::store(Operation::Create)(StoreError::Validation(validation));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message().starts_with("Book validation failed"));
    }

    #[test]
    fn test_unrecognized_store_error_uses_fallback() {
        let timed_out = StoreError::Database(sqlx::Error::PoolTimedOut);
        let err = ApiError::store(Operation::Delete)(timed_out);
        assert_eq!(err.message(), "An error occurred while deleting the book.");

        let closed = StoreError::Database(sqlx::Error::PoolClosed);
        let err = ApiError::store(Operation::List)(closed);
        assert_eq!(
            err.message(),
            "An error occurred while retrieving the list of books."
        );
    }

    #[test]
    fn test_error_body_shape() {
        let body = ErrorResponse {
            error: "boom".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"error": "boom"}));
    }
}
