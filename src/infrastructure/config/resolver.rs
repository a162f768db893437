//! Environment-scoped settings profile resolution.
//!
//! The [`ProfileRegistry`] maps a resolution key (`dev`, `prod`, `test`) to
//! a [`SettingsProfile`], building each profile at most once:
//! - variables are read through a [`SourceChain`], side-file before process
//!   environment;
//! - only names under the environment's prefix (`DEV_`, `PROD_`, `TEST_`)
//!   are considered, so one environment never sees another's values;
//! - fields missing from every source fall back to the environment's
//!   defaults, and anything still missing fails validation.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, info};

use super::sources::{SourceChain, Snapshot};
use crate::domain::models::{Environment, ParseEnvironmentError, SettingsProfile};

/// Process variable holding the resolution key.
pub const ENV_STATE: &str = "ENV_STATE";

/// Field name of the connection string, before prefixing.
pub const DATABASE_URL: &str = "DATABASE_URL";

/// Field name of the rollback flag, before prefixing.
pub const DB_FORCE_ROLL_BACK: &str = "DB_FORCE_ROLL_BACK";

/// Profile resolution errors. All of them are fatal at startup.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Unknown environment '{0}'. Expected one of: dev, prod, test")]
    UnknownEnvironment(String),

    #[error("{0} is not set. Expected one of: dev, prod, test")]
    EnvironmentNotSet(&'static str),

    #[error("Invalid configuration for {field}: {reason}")]
    ValidationError { field: String, reason: String },

    #[error("Failed to read {}: {source}", path.display())]
    SourceReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

type Slot = Mutex<Option<Arc<SettingsProfile>>>;

/// Construct-once cache of settings profiles, one slot per environment.
///
/// The slot lock is held while a profile is built, so concurrent callers
/// resolving the same key wait for the first one and receive the same `Arc`.
pub struct ProfileRegistry {
    sources: SourceChain,
    slots: [Slot; Environment::ALL.len()],
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::new(SourceChain::new())
    }
}

impl ProfileRegistry {
    pub fn new(sources: SourceChain) -> Self {
        Self {
            sources,
            slots: Default::default(),
        }
    }

    pub fn sources(&self) -> &SourceChain {
        &self.sources
    }

    /// Resolve the profile for a resolution key.
    ///
    /// Keys outside `dev | prod | test` fail before any slot is touched.
    pub fn resolve(&self, key: &str) -> Result<Arc<SettingsProfile>, ResolveError> {
        let environment = parse_key(key)?;
        self.resolve_environment(environment)
    }

    /// Resolve the profile for an already-parsed environment.
    pub fn resolve_environment(
        &self,
        environment: Environment,
    ) -> Result<Arc<SettingsProfile>, ResolveError> {
        let mut slot = self.slot(environment);
        if let Some(profile) = slot.as_ref() {
            return Ok(Arc::clone(profile));
        }

        let snapshot = self.sources.snapshot()?;
        let profile = Arc::new(build_profile(environment, &snapshot)?);

        info!(
            environment = %environment,
            database_url = %profile.redacted_database_url(),
            db_force_roll_back = profile.db_force_roll_back,
            "settings profile resolved"
        );

        *slot = Some(Arc::clone(&profile));
        Ok(profile)
    }

    /// The cached profile for `environment`, without building one.
    pub fn cached(&self, environment: Environment) -> Option<Arc<SettingsProfile>> {
        self.slot(environment).clone()
    }

    /// Read `ENV_STATE` from the source chain and parse it.
    pub fn active_environment(&self) -> Result<Environment, ResolveError> {
        let snapshot = self.sources.snapshot()?;
        let (value, origin) = snapshot
            .lookup(ENV_STATE)?
            .ok_or(ResolveError::EnvironmentNotSet(ENV_STATE))?;

        debug!(value, source = %origin, "environment indicator read");
        parse_key(value)
    }

    /// Resolve the profile selected by `ENV_STATE`.
    pub fn resolve_active(&self) -> Result<Arc<SettingsProfile>, ResolveError> {
        let environment = self.active_environment()?;
        self.resolve_environment(environment)
    }

    fn slot(&self, environment: Environment) -> std::sync::MutexGuard<'_, Option<Arc<SettingsProfile>>> {
        // A slot only ever holds a fully built profile, so a poisoned lock is still consistent
        self.slots[environment.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<ParseEnvironmentError> for ResolveError {
    fn from(ParseEnvironmentError(key): ParseEnvironmentError) -> Self {
        Self::UnknownEnvironment(key)
    }
}

fn parse_key(key: &str) -> Result<Environment, ResolveError> {
    Ok(key.parse::<Environment>()?)
}

fn build_profile(
    environment: Environment,
    snapshot: &Snapshot,
) -> Result<SettingsProfile, ResolveError> {
    let prefix = environment.prefix();
    let defaults = environment.defaults();

    let url_field = format!("{prefix}{DATABASE_URL}");
    let database_url = match snapshot.lookup(&url_field)? {
        Some((value, origin)) => {
            debug!(field = %url_field, source = %origin, "field set");
            if value.trim().is_empty() {
                return Err(ResolveError::ValidationError {
                    field: url_field,
                    reason: "must not be empty".to_string(),
                });
            }
            value.to_string()
        }
        None => {
            let default = defaults.database_url.ok_or_else(|| ResolveError::ValidationError {
                field: url_field.clone(),
                reason: "required but not set".to_string(),
            })?;
            debug!(field = %url_field, "field defaulted");
            default.to_string()
        }
    };

    let rollback_field = format!("{prefix}{DB_FORCE_ROLL_BACK}");
    let db_force_roll_back = match snapshot.lookup(&rollback_field)? {
        Some((value, origin)) => {
            debug!(field = %rollback_field, source = %origin, "field set");
            parse_bool(&rollback_field, value)?
        }
        None => defaults.db_force_roll_back,
    };

    Ok(SettingsProfile::new(environment, database_url, db_force_roll_back))
}

fn parse_bool(field: &str, raw: &str) -> Result<bool, ResolveError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Ok(false),
        _ => Err(ResolveError::ValidationError {
            field: field.to_string(),
            reason: format!("'{raw}' is not a boolean"),
        }),
    }
}
