//! Dataapi CLI entry point.

use clap::Parser;

use dataapi::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = dataapi::cli::run(cli).await {
        dataapi::cli::handle_error(&err, json);
    }
}
