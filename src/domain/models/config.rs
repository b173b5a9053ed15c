use serde::{Deserialize, Serialize};

/// Main configuration structure for Troubleshooter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Backend API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Credential configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Operation polling configuration
    #[serde(default)]
    pub polling: PollingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Default page size for list calls
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

const fn default_page_size() -> u32 {
    50
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            auth: AuthConfig::default(),
            polling: PollingConfig::default(),
            logging: LoggingConfig::default(),
            page_size: default_page_size(),
        }
    }
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ApiConfig {
    /// Service root used for API discovery
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API version requested from the discovery endpoint
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum retries for transient transport errors
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial transport retry backoff in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum transport retry backoff in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_base_url() -> String {
    "https://geminicloudassist.googleapis.com".to_string()
}

fn default_api_version() -> String {
    "v1alpha".to_string()
}

const fn default_timeout_secs() -> u64 {
    60
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    500
}

const fn default_max_backoff_ms() -> u64 {
    8_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Credential configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AuthConfig {
    /// Static OAuth access token; when unset the gcloud CLI is asked for one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Path to the gcloud executable
    #[serde(default = "default_gcloud_path")]
    pub gcloud_path: String,
}

fn default_gcloud_path() -> String {
    "gcloud".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            gcloud_path: default_gcloud_path(),
        }
    }
}

/// Long-running operation polling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PollingConfig {
    /// Maximum number of status queries before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first status query, in seconds
    #[serde(default = "default_initial_backoff_secs")]
    pub initial_backoff_secs: f64,

    /// Cap applied to every individual delay, in seconds
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: f64,

    /// Multiplier applied to the delay after each pending status
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

const fn default_max_attempts() -> u32 {
    20
}

const fn default_initial_backoff_secs() -> f64 {
    1.0
}

const fn default_max_backoff_secs() -> f64 {
    32.0
}

const fn default_backoff_factor() -> f64 {
    2.0
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_secs: default_initial_backoff_secs(),
            max_backoff_secs: default_max_backoff_secs(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for debug log files; stderr only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
