//! Domain errors for the posts service.

use thiserror::Error;

/// Domain-level errors that can occur in the posts service.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Post not found: {0}")]
    PostNotFound(i64),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}
