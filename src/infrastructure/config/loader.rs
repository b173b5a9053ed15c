use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Upper bound for `polling.max_backoff_secs`.
pub const MAX_POLLING_BACKOFF_SECS: f64 = 3600.0;

/// Default project config file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "troubleshooter.yaml";

/// Prefix of environment overrides; nested keys are split on `__`.
pub const ENV_PREFIX: &str = "TROUBLESHOOTER_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid base_url: {0}. Must be an http(s) URL")]
    InvalidBaseUrl(String),

    #[error("api_version cannot be empty")]
    EmptyApiVersion,

    #[error("Invalid timeout_secs: {0}. Must be at least 1")]
    InvalidTimeout(u64),

    #[error("Invalid max_retries: {0}. Must be at most 10")]
    InvalidMaxRetries(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid max_attempts: {0}. Must be at least 1")]
    InvalidMaxAttempts(u32),

    #[error(
        "Invalid polling backoff: initial_backoff_secs ({0}) must be positive and not above max_backoff_secs ({1}), which is at most 3600"
    )]
    InvalidPollingBackoff(f64, f64),

    #[error("Invalid backoff_factor: {0}. Must be a finite number of at least 1.0")]
    InvalidBackoffFactor(f64),

    #[error("Invalid page_size: {0}. Must be between 1 and 1000")]
    InvalidPageSize(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. `troubleshooter.yaml` in the working directory (optional)
    /// 3. Environment variables (`TROUBLESHOOTER_*`, highest priority)
    pub fn load() -> Result<Config> {
        Self::extract(Self::figment(Path::new(DEFAULT_CONFIG_FILE)))
            .context("Failed to extract configuration from figment")
    }

    /// Load configuration from a specific file instead of the default one.
    ///
    /// Environment variables still take precedence over the file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file {} does not exist", path.display());
        }
        Self::extract(Self::figment(path))
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    fn figment(file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn extract(figment: Figment) -> Result<Config> {
        let config: Config = figment.extract()?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let api = &config.api;
        if !(api.base_url.starts_with("https://") || api.base_url.starts_with("http://")) {
            return Err(ConfigError::InvalidBaseUrl(api.base_url.clone()));
        }

        if api.api_version.trim().is_empty() {
            return Err(ConfigError::EmptyApiVersion);
        }

        if api.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(api.timeout_secs));
        }

        if api.max_retries > 10 {
            return Err(ConfigError::InvalidMaxRetries(api.max_retries));
        }

        if api.initial_backoff_ms >= api.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                api.initial_backoff_ms,
                api.max_backoff_ms,
            ));
        }

        if config.auth.gcloud_path.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "auth.gcloud_path cannot be empty".to_string(),
            ));
        }

        let polling = &config.polling;
        if polling.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(polling.max_attempts));
        }

        // Comparisons against NaN are false, so finiteness is checked first
        if !polling.initial_backoff_secs.is_finite()
            || !polling.max_backoff_secs.is_finite()
            || polling.initial_backoff_secs <= 0.0
            || polling.initial_backoff_secs > polling.max_backoff_secs
            || polling.max_backoff_secs > MAX_POLLING_BACKOFF_SECS
        {
            return Err(ConfigError::InvalidPollingBackoff(
                polling.initial_backoff_secs,
                polling.max_backoff_secs,
            ));
        }

        if !polling.backoff_factor.is_finite() || polling.backoff_factor < 1.0 {
            return Err(ConfigError::InvalidBackoffFactor(polling.backoff_factor));
        }

        if config.page_size == 0 || config.page_size > 1000 {
            return Err(ConfigError::InvalidPageSize(config.page_size));
        }

        // Validate logging config
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }
}
