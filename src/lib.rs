//! Dataapi - posts and comments web service
//!
//! Dataapi serves a small posts-and-comments JSON API backed by SQLite.
//! Connection settings come from environment-scoped profiles (`dev`,
//! `prod`, `test`) resolved from a `.env` side file, the process
//! environment and built-in defaults.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): Models, the repository port and domain errors
//! - **Infrastructure Layer** (`infrastructure`): Profile resolution, service configuration, logging
//! - **Adapters** (`adapters`): SQLite connector and repository, HTTP routes
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use dataapi::{Database, ProfileRegistry};
//! use dataapi::domain::models::PoolConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = ProfileRegistry::default();
//!     let profile = registry.resolve("dev")?;
//!     let db = Database::connect(&profile, &PoolConfig::default()).await?;
//!     db.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use adapters::http::{router, PostsHttpServer};
pub use adapters::sqlite::{Database, DatabaseError, SqlitePostRepository};
pub use domain::models::{
    Comment, Environment, LoggingConfig, NewComment, NewPost, PoolConfig, Post, PostWithComments,
    ServerConfig, ServiceConfig, SettingsProfile,
};
pub use domain::ports::PostRepository;
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{
    ConfigError, ConfigLoader, ProfileRegistry, ResolveError, SourceChain,
};
