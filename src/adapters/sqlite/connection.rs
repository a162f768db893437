//! SQLite connector honoring the settings profile's rollback flag.
//!
//! With the flag off, every [`Session`] checks a connection out of the pool
//! and writes are durable. With the flag on, [`Database::connect`] pins one
//! connection inside an open transaction, every session runs on it, and
//! [`Database::disconnect`] rolls the transaction back.

use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Sqlite, SqlitePool, Transaction};
use thiserror::Error;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::{debug, info};

use super::migrations::{all_embedded_migrations, Migrator};
use super::DatabaseError;
use crate::domain::models::{PoolConfig, SettingsProfile};

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Failed to create pool: {0}")]
    PoolCreationFailed(#[source] sqlx::Error),
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),
    #[error("Unsupported database URL: {0}. Only sqlite: URLs are supported")]
    UnsupportedDatabase(String),
    #[error("Failed to create directory: {0}")]
    DirectoryCreationFailed(#[source] std::io::Error),
    #[error("Connection failed: {0}")]
    ConnectionFailed(#[source] sqlx::Error),
}

pub async fn create_pool(database_url: &str, config: &PoolConfig) -> Result<SqlitePool, ConnectionError> {
    let path = sqlite_path(database_url)
        .ok_or_else(|| ConnectionError::UnsupportedDatabase(database_url.to_string()))?;
    ensure_database_directory(path)?;

    let connect_options = SqliteConnectOptions::from_str(database_url)
        .map_err(|_| ConnectionError::InvalidDatabaseUrl(database_url.to_string()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(30));

    let options = if is_memory(path) {
        // Every in-memory connection is its own database
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
    };

    options
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_with(connect_options)
        .await
        .map_err(ConnectionError::PoolCreationFailed)
}

/// Database path portion of a `sqlite:` URL, or `None` for other schemes.
fn sqlite_path(database_url: &str) -> Option<&str> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    Some(rest.split('?').next().unwrap_or(rest))
}

fn is_memory(path: &str) -> bool {
    path.is_empty() || path == ":memory:"
}

fn ensure_database_directory(path: &str) -> Result<(), ConnectionError> {
    if is_memory(path) {
        return Ok(());
    }

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(ConnectionError::DirectoryCreationFailed)?;
        }
    }
    Ok(())
}

pub async fn verify_connection(pool: &SqlitePool) -> Result<(), ConnectionError> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(ConnectionError::ConnectionFailed)?;
    Ok(())
}

/// Connection manager shared by the repositories.
pub struct Database {
    pool: SqlitePool,
    pinned: Option<Mutex<Option<Transaction<'static, Sqlite>>>>,
}

impl Database {
    /// Connect using the profile's connection string and rollback flag.
    ///
    /// Pending migrations are applied before the rollback transaction is
    /// opened, so the schema survives a disconnect even when data does not.
    pub async fn connect(profile: &SettingsProfile, config: &PoolConfig) -> Result<Self, DatabaseError> {
        let db = Self::connect_url(&profile.database_url, profile.db_force_roll_back, config).await?;

        info!(
            environment = %profile.environment,
            database_url = %profile.redacted_database_url(),
            db_force_roll_back = profile.db_force_roll_back,
            "database connected"
        );
        Ok(db)
    }

    pub async fn connect_url(
        database_url: &str,
        force_rollback: bool,
        config: &PoolConfig,
    ) -> Result<Self, DatabaseError> {
        let pool = create_pool(database_url, config).await?;
        verify_connection(&pool).await?;

        let applied = Migrator::new(pool.clone())
            .run_embedded_migrations(all_embedded_migrations())
            .await?;
        debug!(applied, "migrations checked");

        let pinned = if force_rollback {
            Some(Mutex::new(Some(pool.begin().await?)))
        } else {
            None
        };

        Ok(Self { pool, pinned })
    }

    /// Whether writes are rolled back on disconnect.
    pub fn force_rollback(&self) -> bool {
        self.pinned.is_some()
    }

    /// The underlying pool. Queries issued on it directly bypass the
    /// rollback transaction.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Borrow a connection for one or more queries.
    pub async fn session(&self) -> Result<Session<'_>, DatabaseError> {
        match &self.pinned {
            Some(slot) => MutexGuard::try_map(slot.lock().await, Option::as_mut)
                .map(Session::Pinned)
                .map_err(|_| DatabaseError::Disconnected),
            None => match self.pool.acquire().await {
                Ok(conn) => Ok(Session::Pooled(conn)),
                Err(sqlx::Error::PoolClosed) => Err(DatabaseError::Disconnected),
                Err(e) => Err(e.into()),
            },
        }
    }

    /// End the unit of work: roll back the pinned transaction, if any, and
    /// close the pool. Calling it again is a no-op.
    pub async fn disconnect(&self) -> Result<(), DatabaseError> {
        if let Some(slot) = &self.pinned {
            if let Some(tx) = slot.lock().await.take() {
                tx.rollback().await?;
                debug!("rollback transaction discarded");
            }
        }
        self.pool.close().await;
        info!("database disconnected");
        Ok(())
    }
}

/// A connection borrowed from a [`Database`].
pub enum Session<'a> {
    Pooled(PoolConnection<Sqlite>),
    Pinned(MappedMutexGuard<'a, Transaction<'static, Sqlite>>),
}

impl Deref for Session<'_> {
    type Target = SqliteConnection;

    fn deref(&self) -> &SqliteConnection {
        match self {
            Self::Pooled(conn) => &**conn,
            Self::Pinned(tx) => &***tx,
        }
    }
}

impl DerefMut for Session<'_> {
    fn deref_mut(&mut self) -> &mut SqliteConnection {
        match self {
            Self::Pooled(conn) => &mut **conn,
            Self::Pinned(tx) => &mut ***tx,
        }
    }
}
