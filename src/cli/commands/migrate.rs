//! Implementation of the `dataapi migrate` command.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::adapters::sqlite::{all_embedded_migrations, create_pool, Migrator};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{ServiceConfig, SettingsProfile};

#[derive(Debug, Serialize)]
pub struct MigrateOutput {
    pub environment: String,
    pub database_url: String,
    pub applied: usize,
    pub schema_version: i64,
}

impl CommandOutput for MigrateOutput {
    fn to_human(&self) -> String {
        let status = if self.applied == 0 {
            "Schema already up to date".to_string()
        } else {
            format!("Applied {} migration(s)", self.applied)
        };
        format!(
            "{status} ({} at {}, schema version {})",
            self.environment, self.database_url, self.schema_version
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Apply migrations directly on a pool; the rollback flag does not apply to schema changes.
pub async fn execute(config: &ServiceConfig, profile: &SettingsProfile, json_mode: bool) -> Result<()> {
    let pool = create_pool(&profile.database_url, &config.database)
        .await
        .context("Failed to open database")?;

    let migrator = Migrator::new(pool.clone());
    let applied = migrator
        .run_embedded_migrations(all_embedded_migrations())
        .await
        .context("Failed to run migrations")?;
    let schema_version = migrator.get_current_version().await?;
    pool.close().await;

    output(
        &MigrateOutput {
            environment: profile.environment.to_string(),
            database_url: profile.redacted_database_url(),
            applied,
            schema_version,
        },
        json_mode,
    );
    Ok(())
}
