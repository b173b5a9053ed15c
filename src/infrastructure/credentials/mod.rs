//! Credentials management infrastructure
//!
//! Access tokens for the backend come either from configuration (or the
//! `TROUBLESHOOTER_AUTH__ACCESS_TOKEN` environment variable) or from the
//! gcloud CLI.

use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::errors::{InvestigationError, InvestigationResult};
use crate::domain::models::AuthConfig;
use crate::domain::ports::CredentialProvider;

/// Provider returning a fixed token.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn access_token(&self) -> InvestigationResult<String> {
        if self.token.trim().is_empty() {
            return Err(InvestigationError::AuthFailed(
                "configured access token is empty".to_string(),
            ));
        }
        Ok(self.token.trim().to_string())
    }
}

/// Tokens printed by gcloud live for an hour; reuse them for less than that.
const GCLOUD_TOKEN_TTL: Duration = Duration::from_secs(45 * 60);

/// Provider running `gcloud auth print-access-token`.
///
/// The printed token is cached until it nears expiry or the backend rejects
/// it.
pub struct GcloudTokenProvider {
    gcloud_path: String,
    ttl: Duration,
    cached: Mutex<Option<(String, Instant)>>,
}

impl GcloudTokenProvider {
    pub fn new(gcloud_path: impl Into<String>) -> Self {
        Self::with_ttl(gcloud_path, GCLOUD_TOKEN_TTL)
    }

    pub fn with_ttl(gcloud_path: impl Into<String>, ttl: Duration) -> Self {
        Self {
            gcloud_path: gcloud_path.into(),
            ttl,
            cached: Mutex::new(None),
        }
    }

    async fn print_access_token(&self) -> InvestigationResult<String> {
        debug!(gcloud = %self.gcloud_path, "requesting access token from gcloud");

        let output = Command::new(&self.gcloud_path)
            .args(["auth", "print-access-token"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                InvestigationError::AuthFailed(format!(
                    "failed to run '{}': {e}",
                    self.gcloud_path
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InvestigationError::AuthFailed(format!(
                "'{} auth print-access-token' exited with {}: {}",
                self.gcloud_path,
                output.status,
                stderr.trim()
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(InvestigationError::AuthFailed(
                "gcloud returned an empty access token".to_string(),
            ));
        }
        Ok(token)
    }
}

impl std::fmt::Debug for GcloudTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcloudTokenProvider")
            .field("gcloud_path", &self.gcloud_path)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CredentialProvider for GcloudTokenProvider {
    async fn access_token(&self) -> InvestigationResult<String> {
        let mut cached = self.cached.lock().await;
        if let Some((token, fetched_at)) = cached.as_ref() {
            if fetched_at.elapsed() < self.ttl {
                return Ok(token.clone());
            }
        }

        let token = self.print_access_token().await?;
        *cached = Some((token.clone(), Instant::now()));
        Ok(token)
    }

    async fn refresh_token(&self) -> InvestigationResult<String> {
        let mut cached = self.cached.lock().await;
        *cached = None;

        let token = self.print_access_token().await?;
        *cached = Some((token.clone(), Instant::now()));
        Ok(token)
    }
}

/// Static token when one is configured, gcloud otherwise.
pub fn provider_from_config(config: &AuthConfig) -> Arc<dyn CredentialProvider> {
    match config
        .access_token
        .as_deref()
        .filter(|t| !t.trim().is_empty())
    {
        Some(token) => Arc::new(StaticTokenProvider::new(token)),
        None => Arc::new(GcloudTokenProvider::new(config.gcloud_path.clone())),
    }
}
