//! SQLite database adapters for the posts service.

pub mod connection;
pub mod migrations;
pub mod post_repository;

pub use connection::{create_pool, verify_connection, ConnectionError, Database, Session};
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};
pub use post_repository::SqlitePostRepository;

use chrono::{DateTime, Utc};

use crate::domain::errors::{DomainError, DomainResult};

/// Parse an RFC3339 datetime string from a SQLite row field.
pub fn parse_datetime(s: &str) -> DomainResult<DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| DomainError::SerializationError(e.to_string()))
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),
    #[error("Database is disconnected")]
    Disconnected,
}

impl From<DatabaseError> for DomainError {
    fn from(err: DatabaseError) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}
