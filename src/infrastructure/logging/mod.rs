//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - stderr output, pretty or JSON
//! - optional rolling JSON debug log files

pub mod config;
pub mod logger;

pub use config::{LogConfig, LogFormat, RotationPolicy};
pub use logger::LoggerImpl;
