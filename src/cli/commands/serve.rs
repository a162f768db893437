//! Implementation of the `dataapi serve` command.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use crate::adapters::http::PostsHttpServer;
use crate::adapters::sqlite::{Database, SqlitePostRepository};
use crate::domain::models::{ServerConfig, ServiceConfig, SettingsProfile};

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Host to bind to (defaults to server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (defaults to server.port)
    #[arg(long, short)]
    pub port: Option<u16>,
}

impl ServeArgs {
    fn apply(self, mut server: ServerConfig) -> ServerConfig {
        if let Some(host) = self.host {
            server.host = host;
        }
        if let Some(port) = self.port {
            server.port = port;
        }
        server
    }
}

pub async fn execute(args: ServeArgs, config: &ServiceConfig, profile: &SettingsProfile) -> Result<()> {
    let server_config = args.apply(config.server.clone());

    let db = Arc::new(
        Database::connect(profile, &config.database)
            .await
            .context("Failed to connect to database")?,
    );
    let repo = SqlitePostRepository::new(Arc::clone(&db));

    info!(environment = %profile.environment, "starting posts service");
    let served = PostsHttpServer::new(repo, server_config)
        .serve_with_shutdown(shutdown_signal())
        .await;

    // Ends the unit of work even when the server failed
    db.disconnect().await.context("Failed to disconnect database")?;
    served.map_err(|e| anyhow::anyhow!(e))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
