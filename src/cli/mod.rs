//! Command-line interface.

pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::domain::models::{ServiceConfig, SettingsProfile};
use crate::infrastructure::config::{ConfigLoader, ProfileRegistry, ResolveError};
use crate::infrastructure::logging::LoggerImpl;

use commands::serve::ServeArgs;

#[derive(Parser, Debug)]
#[command(name = "dataapi", version, about = "Posts and comments web service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Environment to run as (dev, prod, test); replaces the ENV_STATE lookup
    #[arg(long = "env", global = true, value_name = "KEY")]
    pub env: Option<String>,

    /// Service configuration file; replaces .dataapi/*.yaml and DATAAPI_* variables
    #[arg(long, global = true, value_name = "PATH")]
    pub config_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP service
    Serve(ServeArgs),

    /// Apply pending database migrations and exit
    Migrate,

    /// Show the resolved settings profile and service configuration
    Config,
}

/// Resolve the profile for `--env`, or for `ENV_STATE` when no key is given.
pub fn resolve_profile(
    registry: &ProfileRegistry,
    env: Option<&str>,
) -> Result<Arc<SettingsProfile>, ResolveError> {
    match env {
        Some(key) => registry.resolve(key),
        None => registry.resolve_active(),
    }
}

pub fn load_service_config(path: Option<&Path>) -> Result<ServiceConfig> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Load configuration, start logging, resolve the profile and run the command.
///
/// The profile is resolved before any command runs, so a bad environment
/// never reaches the database or the listener.
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_service_config(cli.config_file.as_deref())?;
    let _logger = LoggerImpl::init(&config.logging)?;

    let registry = ProfileRegistry::default();
    let profile = resolve_profile(&registry, cli.env.as_deref())
        .context("Failed to resolve settings profile")?;

    match cli.command {
        Commands::Serve(args) => commands::serve::execute(args, &config, &profile).await,
        Commands::Migrate => commands::migrate::execute(&config, &profile, cli.json).await,
        Commands::Config => {
            commands::config::execute(&config, &profile, cli.json);
            Ok(())
        }
    }
}

/// Report a fatal error and exit non-zero.
pub fn handle_error(err: &anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
