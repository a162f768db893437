//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dataapi::domain::models::PoolConfig;
use dataapi::{Database, SourceChain};
use tempfile::TempDir;

/// Create a temporary directory for test isolation
///
/// Returns a TempDir that will be cleaned up when dropped.
#[allow(dead_code)]
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Create a temporary test database path
///
/// Returns the path to a SQLite database file in a temporary directory.
#[allow(dead_code)]
pub fn temp_db_path() -> (TempDir, PathBuf) {
    let dir = temp_dir();
    let db_path = dir.path().join("test.db");
    (dir, db_path)
}

/// `sqlite://` URL for a database file.
#[allow(dead_code)]
pub fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}", path.display())
}

/// Write a `.env` style side file into `dir` and return its path.
#[allow(dead_code)]
pub fn write_side_file(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join(".env");
    std::fs::write(&path, contents).expect("Failed to write side file");
    path
}

/// Source chain that reads only the given variables.
#[allow(dead_code)]
pub fn isolated_sources(vars: &[(&str, &str)]) -> SourceChain {
    SourceChain::new()
        .without_side_file()
        .with_ambient_vars(vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())))
}

/// Connect to `url`; the schema is migrated during connect.
#[allow(dead_code)]
pub async fn setup_database(url: &str, force_rollback: bool) -> Arc<Database> {
    let db = Database::connect_url(url, force_rollback, &PoolConfig::default())
        .await
        .expect("failed to connect test database");
    Arc::new(db)
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
