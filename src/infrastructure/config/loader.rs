use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::ServiceConfig;

/// Project-local service configuration file
pub const CONFIG_FILE: &str = ".dataapi/config.yaml";

/// Optional local overrides, not meant to be committed
pub const LOCAL_CONFIG_FILE: &str = ".dataapi/local.yaml";

/// Prefix of service configuration variables
pub const ENV_PREFIX: &str = "DATAAPI_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port: {0}. Must be between 1 and 65535")]
    InvalidPort(u16),

    #[error("Server host cannot be empty")]
    EmptyHost,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid min_connections: {0} exceeds max_connections ({1})")]
    InvalidMinConnections(u32, u32),

    #[error("Invalid acquire_timeout_secs: {0}. Must be at least 1")]
    InvalidAcquireTimeout(u64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .dataapi/config.yaml
    /// 3. .dataapi/local.yaml (optional)
    /// 4. Environment variables (DATAAPI_* prefix, `__` separates sections)
    pub fn load() -> Result<ServiceConfig> {
        let config: ServiceConfig = Figment::new()
            .merge(Serialized::defaults(ServiceConfig::default()))
            .merge(Yaml::file(CONFIG_FILE))
            .merge(Yaml::file(LOCAL_CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<ServiceConfig> {
        let config: ServiceConfig = Figment::new()
            .merge(Serialized::defaults(ServiceConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &ServiceConfig) -> Result<(), ConfigError> {
        if config.server.port == 0 {
            return Err(ConfigError::InvalidPort(config.server.port));
        }

        if config.server.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }

        let pool = &config.database;
        if pool.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(pool.max_connections));
        }

        if pool.min_connections > pool.max_connections {
            return Err(ConfigError::InvalidMinConnections(
                pool.min_connections,
                pool.max_connections,
            ));
        }

        if pool.acquire_timeout_secs == 0 {
            return Err(ConfigError::InvalidAcquireTimeout(pool.acquire_timeout_secs));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::RotationPolicy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.rotation, RotationPolicy::Daily);
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
server:
  host: 0.0.0.0
  port: 9000
  enable_cors: false
database:
  max_connections: 8
logging:
  level: debug
  format: pretty
  rotation: hourly
";

        let config: ServiceConfig = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert!(!config.server.enable_cors);
        assert_eq!(config.database.max_connections, 8);
        assert_eq!(config.database.min_connections, 1);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.logging.rotation, RotationPolicy::Hourly);

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_zero_port() {
        let mut config = ServiceConfig::default();
        config.server.port = 0;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidPort(0)
        ));
    }

    #[test]
    fn test_validate_empty_host() {
        let mut config = ServiceConfig::default();
        config.server.host = " ".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::EmptyHost
        ));
    }

    #[test]
    fn test_validate_zero_max_connections() {
        let mut config = ServiceConfig::default();
        config.database.max_connections = 0;
        config.database.min_connections = 0;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidMaxConnections(0)
        ));
    }

    #[test]
    fn test_validate_min_exceeds_max() {
        let mut config = ServiceConfig::default();
        config.database.min_connections = 10;
        config.database.max_connections = 2;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidMinConnections(10, 2)
        ));
    }

    #[test]
    fn test_validate_zero_acquire_timeout() {
        let mut config = ServiceConfig::default();
        config.database.acquire_timeout_secs = 0;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidAcquireTimeout(0)
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = ServiceConfig::default();
        config.logging.level = "verbose".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "verbose"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = ServiceConfig::default();
        config.logging.format = "xml".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogFormat(format) => assert_eq!(format, "xml"),
            other => panic!("Expected InvalidLogFormat error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_from_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: 8080").unwrap();
        file.flush().unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1", "Default should persist when not overridden");
    }

    #[test]
    fn test_load_from_file_rejects_invalid() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "logging:\n  format: xml").unwrap();
        file.flush().unwrap();

        assert!(ConfigLoader::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_env_override() {
        temp_env::with_vars(
            [
                ("DATAAPI_SERVER__PORT", Some("9100")),
                ("DATAAPI_LOGGING__LEVEL", Some("debug")),
            ],
            || {
                let config: ServiceConfig = Figment::new()
                    .merge(Serialized::defaults(ServiceConfig::default()))
                    .merge(Env::prefixed(ENV_PREFIX).split("__"))
                    .extract()
                    .unwrap();

                assert_eq!(config.server.port, 9100);
                assert_eq!(config.logging.level, "debug");
                assert_eq!(config.logging.format, "json");
            },
        );
    }

    #[test]
    fn test_hierarchical_merging() {
        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(base_file, "server:\n  port: 8001\nlogging:\n  level: info\n  format: pretty").unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "server:\n  port: 8002\nlogging:\n  level: warn").unwrap();
        override_file.flush().unwrap();

        let config: ServiceConfig = Figment::new()
            .merge(Serialized::defaults(ServiceConfig::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.server.port, 8002, "Override should win");
        assert_eq!(config.logging.level, "warn", "Override should win for nested fields");
        assert_eq!(config.logging.format, "pretty", "Base value should persist when not overridden");
    }
}
