//! Error types for the storage layer.

use books_core::{BookValidationError, InvalidSortError};
use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Error reported by the database driver or server.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Required book fields missing or blank.
    #[error(transparent)]
    Validation(#[from] BookValidationError),

    /// A record identifier that is not in the store's id format.
    #[error("Id not valid")]
    InvalidIdentifier(String),

    /// Listing parameters the store cannot execute (bad sort, negative window).
    #[error("{0}")]
    InvalidQuery(String),

    /// Migration error.
    #[error("migration error: {0}")]
    MigrationError(String),
}

impl From<InvalidSortError> for StoreError {
    fn from(err: InvalidSortError) -> Self {
        Self::InvalidQuery(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_identifier_message() {
        let err = StoreError::InvalidIdentifier("abc".to_string());
        assert_eq!(err.to_string(), "Id not valid");
    }

    #[test]
    fn test_sort_error_becomes_invalid_query() {
        let err: StoreError = InvalidSortError {
            field: "title".to_string(),
            value: "sideways".to_string(),
        }
        .into();
        assert!(matches!(err, StoreError::InvalidQuery(_)));
        assert_eq!(err.to_string(), "Invalid sort value: {title: sideways}");
    }
}
