//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "troubleshooter")]
#[command(about = "Troubleshooter - cloud investigation sessions for agents", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./troubleshooter.yaml)
    #[arg(short, long, global = true, env = "TROUBLESHOOTER_CONFIG_FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new investigation
    Create(CreateArgs),

    /// Fetch an investigation or list investigations in a project
    Fetch(FetchArgs),

    /// Run an investigation revision and wait for the analysis
    Run(RunArgs),

    /// Add an observation to the latest revision of an investigation
    AddObservation(AddObservationArgs),

    /// Serve the investigation tools over MCP on stdin/stdout
    Serve,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Short title of the issue
    #[arg(short, long)]
    pub title: String,

    /// Google Cloud project id
    #[arg(short, long)]
    pub project: String,

    /// Description of the issue
    #[arg(short, long)]
    pub description: String,

    /// Relevant resources (full resource names starting with '//', comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub resource: Vec<String>,

    /// RFC 3339 time the issue started
    #[arg(short, long)]
    pub start_time: Option<String>,
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Google Cloud project id
    #[arg(short, long)]
    pub project: String,

    /// Investigation id; omit to list investigations
    #[arg(short, long)]
    pub investigation: Option<String>,

    /// Revision id (requires --investigation)
    #[arg(short, long, requires = "investigation")]
    pub revision: Option<String>,

    /// Only list investigations with this title
    #[arg(short, long, conflicts_with = "investigation")]
    pub title: Option<String>,

    /// Maximum number of investigations to list
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Page token from a previous list
    #[arg(long)]
    pub page_token: Option<String>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Google Cloud project id
    #[arg(short, long)]
    pub project: String,

    /// Investigation id
    #[arg(short, long)]
    pub investigation: String,

    /// Revision id to run
    #[arg(short, long)]
    pub revision: String,
}

#[derive(Args, Debug)]
pub struct AddObservationArgs {
    /// Google Cloud project id
    #[arg(short, long)]
    pub project: String,

    /// Investigation id
    #[arg(short, long)]
    pub investigation: String,

    /// Observation text
    pub observation: String,

    /// Additional relevant resources (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub resource: Vec<String>,
}
