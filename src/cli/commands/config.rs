//! Implementation of the `dataapi config` command.

use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{ServiceConfig, SettingsProfile};

#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    pub environment: String,
    pub database_url: String,
    pub db_force_roll_back: bool,
    pub service: ServiceConfig,
}

impl ConfigOutput {
    pub fn new(config: &ServiceConfig, profile: &SettingsProfile) -> Self {
        Self {
            environment: profile.environment.to_string(),
            database_url: profile.redacted_database_url(),
            db_force_roll_back: profile.db_force_roll_back,
            service: config.clone(),
        }
    }
}

impl CommandOutput for ConfigOutput {
    fn to_human(&self) -> String {
        let server = &self.service.server;
        let pool = &self.service.database;
        let logging = &self.service.logging;

        let mut table = Table::new();
        table.load_preset(UTF8_FULL).set_header(vec!["Setting", "Value"]);
        table.add_row(vec!["environment".to_string(), self.environment.clone()]);
        table.add_row(vec!["database_url".to_string(), self.database_url.clone()]);
        table.add_row(vec!["db_force_roll_back".to_string(), self.db_force_roll_back.to_string()]);
        table.add_row(vec!["server".to_string(), format!("{}:{}", server.host, server.port)]);
        table.add_row(vec!["cors".to_string(), server.enable_cors.to_string()]);
        table.add_row(vec![
            "pool".to_string(),
            format!(
                "{}..{} connections, {}s acquire timeout",
                pool.min_connections, pool.max_connections, pool.acquire_timeout_secs
            ),
        ]);
        table.add_row(vec!["logging".to_string(), format!("{} ({})", logging.level, logging.format)]);
        table.to_string()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn execute(config: &ServiceConfig, profile: &SettingsProfile, json_mode: bool) {
    output(&ConfigOutput::new(config, profile), json_mode);
}
