//! Configuration management infrastructure
//!
//! Two independent layers:
//! - Settings profiles: environment-scoped connection settings selected by
//!   `ENV_STATE`, read from `.env` and the process environment under a
//!   per-environment prefix, built once per environment
//! - Service configuration: figment-merged defaults, YAML files and
//!   `DATAAPI_*` variables for the server, pool and logging

pub mod loader;
pub mod resolver;
pub mod sources;

pub use loader::{ConfigError, ConfigLoader};
pub use resolver::{ProfileRegistry, ResolveError, ENV_STATE};
pub use sources::{SourceChain, SourceOrigin, Snapshot, DEFAULT_SIDE_FILE};
