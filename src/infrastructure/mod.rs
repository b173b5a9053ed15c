//! Infrastructure layer module
//!
//! Adapters satisfying the port traits defined in the domain layer:
//! - Cloud Assist HTTP backend
//! - Credential providers
//! - Configuration management
//! - Logging infrastructure

pub mod cloud_assist;
pub mod config;
pub mod credentials;
pub mod logging;
