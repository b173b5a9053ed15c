use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use super::errors::TransportError;
use super::retry::RetryPolicy;
use crate::domain::errors::{InvestigationError, InvestigationResult, RemoteCall};
use crate::domain::models::{ApiConfig, Investigation, InvestigationPage, Operation, RevisionRequest};
use crate::domain::ports::{CredentialProvider, InvestigationBackend, ListRequest};

/// HTTP backend for the Gemini Cloud Assist investigations API
///
/// API discovery happens lazily on the first call and is cached for the
/// lifetime of the client. Access tokens are requested for every call.
pub struct CloudAssistClient {
    http_client: ReqwestClient,
    base_url: String,
    api_version: String,
    credentials: Arc<dyn CredentialProvider>,
    retry_policy: RetryPolicy,
    /// Request root resolved by API discovery, once per client.
    api_root: OnceCell<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscoveryDocument {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    root_url: Option<String>,
    #[serde(default)]
    service_path: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    resources: Value,
}

impl DiscoveryDocument {
    fn has_investigations(&self) -> bool {
        self.resources["projects"]["resources"]["locations"]["resources"]["investigations"]
            .is_object()
    }

    /// `{baseUrl}{version}/`, with `baseUrl` falling back to
    /// `rootUrl + servicePath`.
    fn api_root(&self, configured_version: &str) -> Option<String> {
        let base = match (&self.base_url, &self.root_url) {
            (Some(base), _) => base.clone(),
            (None, Some(root)) => format!("{root}{}", self.service_path.as_deref().unwrap_or("")),
            (None, None) => return None,
        };
        let base = if base.ends_with('/') {
            base
        } else {
            format!("{base}/")
        };
        let version = self.version.as_deref().unwrap_or(configured_version);
        Some(format!("{base}{version}/"))
    }
}

/// Response of a create-revision call.
#[derive(Debug, Deserialize)]
struct RevisionResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    snapshot: Option<Investigation>,
}

impl CloudAssistClient {
    /// Create a client from API configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(
        config: &ApiConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, TransportError> {
        info!(
            base_url = %config.base_url,
            api_version = %config.api_version,
            timeout_secs = config.timeout_secs,
            "initializing Cloud Assist client"
        );

        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(4)
            .tcp_nodelay(true)
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            credentials,
            retry_policy: RetryPolicy::new(
                config.max_retries,
                config.initial_backoff_ms,
                config.max_backoff_ms,
            ),
            api_root: OnceCell::new(),
        })
    }

    /// Bearer token for the next call. Tokens are never cached here; the
    /// provider decides how long one stays valid.
    async fn token(&self, refresh: bool) -> InvestigationResult<String> {
        let token = if refresh {
            self.credentials.refresh_token().await
        } else {
            self.credentials.access_token().await
        };
        token.map_err(|e| match e {
            InvestigationError::AuthFailed(_) => e,
            other => InvestigationError::AuthFailed(other.to_string()),
        })
    }

    async fn api_root(&self, token: &str) -> InvestigationResult<&str> {
        self.api_root
            .get_or_try_init(|| self.discover(token))
            .await
            .map(String::as_str)
    }

    #[instrument(skip(self, token))]
    async fn discover(&self, token: &str) -> InvestigationResult<String> {
        let url = format!("{}/$discovery/rest", self.base_url);
        let query = [("version", self.api_version.clone())];
        let document: DiscoveryDocument = self
            .retry_policy
            .execute(|| self.send_once(Method::GET, &url, token, &query, None))
            .await
            .map_err(|e| InvestigationError::ApiDiscoveryFailed(e.to_string()))?;

        if !document.has_investigations() {
            return Err(InvestigationError::ApiDiscoveryFailed(format!(
                "discovery document for {} does not describe projects.locations.investigations",
                self.api_version
            )));
        }
        let api_root = document.api_root(&self.api_version).ok_or_else(|| {
            InvestigationError::ApiDiscoveryFailed(
                "discovery document has neither baseUrl nor rootUrl".to_string(),
            )
        })?;

        info!(%api_root, "API discovery complete");
        Ok(api_root)
    }

    /// Send one request and decode the JSON response
    async fn send_once<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        token: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, TransportError> {
        let mut request = self.http_client.request(method, url).bearer_auth(token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::from_status(status, &body));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn send_with_retry<T: DeserializeOwned>(
        &self,
        method: &Method,
        url: &str,
        token: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, TransportError> {
        self.retry_policy
            .execute(|| self.send_once(method.clone(), url, token, query, body))
            .await
    }

    /// Call `{api_root}{resource}` with retries, mapping failures to `call`.
    ///
    /// A 401 is answered by asking the provider for a fresh token and
    /// repeating the call once.
    async fn call<T: DeserializeOwned>(
        &self,
        call: RemoteCall,
        method: Method,
        resource: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> InvestigationResult<T> {
        let token = self.token(false).await?;
        let url = format!("{}{resource}", self.api_root(&token).await?);
        debug!(call = %call, %url, "calling backend");

        let body = body.as_ref();
        let result = match self.send_with_retry(&method, &url, &token, query, body).await {
            Err(TransportError::Unauthenticated { message, .. }) => {
                warn!(call = %call, %message, "access token rejected, refreshing");
                let token = self.token(true).await?;
                self.send_with_retry(&method, &url, &token, query, body).await
            }
            other => other,
        };
        result.map_err(|e| e.into_investigation_error(call))
    }
}

fn to_body<T: Serialize>(value: &T) -> InvestigationResult<Value> {
    serde_json::to_value(value).map_err(|e| InvestigationError::PayloadCreationFailed(e.to_string()))
}

#[async_trait]
impl InvestigationBackend for CloudAssistClient {
    async fn list(&self, request: ListRequest) -> InvestigationResult<InvestigationPage> {
        let mut query = Vec::new();
        if let Some(filter) = request.filter {
            query.push(("filter", filter));
        }
        if let Some(page_size) = request.page_size {
            query.push(("pageSize", page_size.to_string()));
        }
        if let Some(page_token) = request.page_token {
            query.push(("pageToken", page_token));
        }

        let resource = format!("{}/investigations", request.parent);
        self.call(RemoteCall::List, Method::GET, &resource, &query, None)
            .await
    }

    async fn get(&self, name: &str) -> InvestigationResult<Investigation> {
        self.call(RemoteCall::Get, Method::GET, name, &[], None).await
    }

    async fn create(
        &self,
        parent: &str,
        body: &Investigation,
    ) -> InvestigationResult<Investigation> {
        let resource = format!("{parent}/investigations");
        self.call(
            RemoteCall::Create,
            Method::POST,
            &resource,
            &[],
            Some(to_body(body)?),
        )
        .await
    }

    async fn run_revision(&self, name: &str) -> InvestigationResult<Operation> {
        let resource = format!("{name}:run");
        self.call(
            RemoteCall::RunRevision,
            Method::POST,
            &resource,
            &[],
            Some(Value::Object(serde_json::Map::new())),
        )
        .await
    }

    async fn get_operation(&self, name: &str) -> InvestigationResult<Operation> {
        self.call(RemoteCall::GetOperation, Method::GET, name, &[], None)
            .await
    }

    async fn create_revision(
        &self,
        parent: &str,
        body: &RevisionRequest,
    ) -> InvestigationResult<Investigation> {
        let resource = format!("{parent}/revisions");
        let response: RevisionResponse = self
            .call(
                RemoteCall::CreateRevision,
                Method::POST,
                &resource,
                &[],
                Some(to_body(body)?),
            )
            .await?;

        let mut snapshot = response.snapshot.unwrap_or_default();
        if snapshot.name.is_empty() {
            snapshot.name = parent.to_string();
        }
        if !response.name.is_empty() {
            snapshot.revision = Some(response.name);
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: Value) -> DiscoveryDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_api_root_prefers_base_url() {
        let doc = document(json!({
            "baseUrl": "https://geminicloudassist.googleapis.com/",
            "rootUrl": "https://ignored/",
            "version": "v1alpha"
        }));
        assert_eq!(
            doc.api_root("v1").as_deref(),
            Some("https://geminicloudassist.googleapis.com/v1alpha/")
        );
    }

    #[test]
    fn test_api_root_falls_back_to_root_url() {
        let doc = document(json!({"rootUrl": "http://localhost:8080", "servicePath": ""}));
        assert_eq!(
            doc.api_root("v1alpha").as_deref(),
            Some("http://localhost:8080/v1alpha/")
        );
        assert!(document(json!({})).api_root("v1alpha").is_none());
    }

    #[test]
    fn test_has_investigations() {
        let doc = document(json!({
            "resources": {"projects": {"resources": {"locations": {"resources": {
                "investigations": {"methods": {}}
            }}}}}
        }));
        assert!(doc.has_investigations());
        assert!(!document(json!({"resources": {}})).has_investigations());
    }
}
