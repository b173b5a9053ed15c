use async_trait::async_trait;

use crate::domain::errors::InvestigationResult;
use crate::domain::models::{Investigation, InvestigationPage, Operation, RevisionRequest};

/// Parameters for a list call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    /// `projects/{project}/locations/global`
    pub parent: String,
    /// Backend filter expression
    pub filter: Option<String>,
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
}

/// Port trait for the remote investigation API.
///
/// Every method is a fallible remote call. Implementations must map backend
/// rejections to `InvestigationError::RemoteCallFailed` with the backend's
/// payload attached verbatim, and wrap unexpected transport failures the same
/// way so callers always see a typed error.
#[async_trait]
pub trait InvestigationBackend: Send + Sync {
    /// List investigations under a parent.
    async fn list(&self, request: ListRequest) -> InvestigationResult<InvestigationPage>;

    /// Fetch an investigation or a specific revision of it by name.
    async fn get(&self, name: &str) -> InvestigationResult<Investigation>;

    /// Create an investigation under `parent`.
    async fn create(&self, parent: &str, body: &Investigation)
        -> InvestigationResult<Investigation>;

    /// Start the analysis of a revision. Returns the operation handle.
    async fn run_revision(&self, name: &str) -> InvestigationResult<Operation>;

    /// Query a long-running operation once.
    async fn get_operation(&self, name: &str) -> InvestigationResult<Operation>;

    /// Create a new revision under the investigation named `parent`.
    ///
    /// The returned snapshot has `revision` set to the new revision's name.
    async fn create_revision(
        &self,
        parent: &str,
        body: &RevisionRequest,
    ) -> InvestigationResult<Investigation>;
}
