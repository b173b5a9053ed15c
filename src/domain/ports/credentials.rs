use async_trait::async_trait;

use crate::domain::errors::InvestigationResult;

/// Source of access tokens for the backend.
///
/// The engine never inspects the token; it is passed through to the transport.
/// Failures must surface as `InvestigationError::AuthFailed`.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Obtain a bearer token for the next backend call.
    ///
    /// Called once per backend call; providers may hand out a cached token.
    async fn access_token(&self) -> InvestigationResult<String>;

    /// Obtain a new token after the backend rejected the current one.
    async fn refresh_token(&self) -> InvestigationResult<String> {
        self.access_token().await
    }
}
