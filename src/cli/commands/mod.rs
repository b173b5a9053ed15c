//! CLI command implementations.

pub mod investigation;
pub mod serve;

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::cli::output::output;
use crate::cli::types::Commands;
use crate::domain::models::Config;
use crate::infrastructure::cloud_assist::CloudAssistClient;
use crate::infrastructure::credentials::provider_from_config;
use crate::services::InvestigationClient;

/// Build the session engine over the HTTP backend.
pub fn build_client(config: &Config) -> Result<InvestigationClient<CloudAssistClient>> {
    let credentials = provider_from_config(&config.auth);
    let backend = CloudAssistClient::new(&config.api, credentials)
        .context("Failed to build Cloud Assist client")?;
    Ok(InvestigationClient::new(Arc::new(backend), config))
}

/// Dispatch a parsed command.
pub async fn execute(command: Commands, config: &Config, json: bool) -> Result<()> {
    let client = build_client(config)?;

    let report = match command {
        Commands::Create(args) => investigation::create(&client, args).await?,
        Commands::Fetch(args) => investigation::fetch(&client, args).await?,
        Commands::Run(args) => investigation::run(&client, args).await?,
        Commands::AddObservation(args) => investigation::add_observation(&client, args).await?,
        Commands::Serve => return serve::execute(client).await,
    };

    output(&report, json);
    Ok(())
}
