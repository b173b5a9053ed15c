//! Troubleshooter CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;

use troubleshooter::cli::{commands, handle_error, Cli};
use troubleshooter::infrastructure::config::ConfigLoader;
use troubleshooter::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(&err, json);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging))
        .context("Failed to initialize logging")?;

    commands::execute(cli.command, &config, cli.json).await
}
