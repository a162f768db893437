//! Settings profiles: one resolved set of connection settings per
//! deployment environment.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Deployment environment selected by the resolution key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Environment {
    /// Local development (`dev`, variables prefixed `DEV_`)
    #[serde(rename = "dev")]
    Dev,
    /// Production (`prod`, variables prefixed `PROD_`)
    #[serde(rename = "prod")]
    Prod,
    /// Isolated test runs (`test`, variables prefixed `TEST_`)
    #[serde(rename = "test")]
    Test,
}

/// Built-in values applied when no source supplies a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileDefaults {
    pub database_url: Option<&'static str>,
    pub db_force_roll_back: bool,
}

/// Connection string used by the `test` profile when nothing overrides it.
pub const TEST_DATABASE_URL: &str = "sqlite://test.db";

impl Environment {
    /// Every recognized environment, in slot order.
    pub const ALL: [Self; 3] = [Self::Dev, Self::Prod, Self::Test];

    /// The resolution key for this environment.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Prod => "prod",
            Self::Test => "test",
        }
    }

    /// The variable namespace prefix read by this environment's profile.
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Dev => "DEV_",
            Self::Prod => "PROD_",
            Self::Test => "TEST_",
        }
    }

    pub const fn defaults(self) -> ProfileDefaults {
        match self {
            Self::Dev | Self::Prod => ProfileDefaults {
                database_url: None,
                db_force_roll_back: false,
            },
            Self::Test => ProfileDefaults {
                database_url: Some(TEST_DATABASE_URL),
                db_force_roll_back: true,
            },
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Dev => 0,
            Self::Prod => 1,
            Self::Test => 2,
        }
    }
}

/// A resolution key outside `dev | prod | test`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized environment key '{0}'")]
pub struct ParseEnvironmentError(pub String);

impl FromStr for Environment {
    type Err = ParseEnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            "test" => Ok(Self::Test),
            other => Err(ParseEnvironmentError(other.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Fully resolved settings for one environment.
///
/// Built once by the profile registry and shared behind an `Arc`; nothing
/// mutates it after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsProfile {
    /// Environment this profile was resolved for
    pub environment: Environment,
    /// Database connection string
    pub database_url: String,
    /// Roll back every write at the end of the connector's unit of work
    pub db_force_roll_back: bool,
}

impl SettingsProfile {
    pub fn new(environment: Environment, database_url: impl Into<String>, db_force_roll_back: bool) -> Self {
        Self {
            environment,
            database_url: database_url.into(),
            db_force_roll_back,
        }
    }

    /// Connection string with any password replaced by `***`.
    pub fn redacted_database_url(&self) -> String {
        redact_url(&self.database_url)
    }
}

fn redact_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://").map(|i| i + 3) else {
        return url.to_string();
    };
    let rest = &url[scheme_end..];
    let authority = &rest[..rest.find('/').unwrap_or(rest.len())];

    let Some(at) = authority.rfind('@') else {
        return url.to_string();
    };
    let Some(colon) = authority[..at].find(':') else {
        return url.to_string();
    };

    format!("{}{}:***{}", &url[..scheme_end], &authority[..colon], &rest[at..])
}
