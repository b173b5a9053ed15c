//! Troubleshooter - cloud investigation sessions for agents
//!
//! Creates, fetches, runs and revises troubleshooting investigations held by
//! the Gemini Cloud Assist investigations API, and renders them as markdown
//! reports an agent can read and act on.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): data model, resource paths, errors and ports
//! - **Service Layer** (`services`): merging, polling, rendering and the
//!   session orchestrator
//! - **Infrastructure Layer** (`infrastructure`): HTTP backend, credentials,
//!   configuration and logging
//! - **Adapters** (`adapters`): MCP stdio server
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use troubleshooter::infrastructure::cloud_assist::MockInvestigationBackend;
//! use troubleshooter::services::{CreateRequest, InvestigationClient};
//! use troubleshooter::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = InvestigationClient::new(
//!         Arc::new(MockInvestigationBackend::new()),
//!         &Config::default(),
//!     );
//!     let report = client
//!         .create(CreateRequest {
//!             title: "Checkout errors".into(),
//!             project_id: "proj1".into(),
//!             description: "500s on /checkout".into(),
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("{}", report.markdown);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{ErrorKind, ErrorReport, InvestigationError, InvestigationResult};
pub use domain::models::{Config, Investigation, InvestigationPath, Observation};
pub use domain::ports::{CredentialProvider, InvestigationBackend};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::InvestigationClient;
