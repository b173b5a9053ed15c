//! Investigation session orchestration.
//!
//! Composes path resolution, the revision merger, the operation poller and the
//! report renderer around an [`InvestigationBackend`]. Every call works on a
//! snapshot fetched fresh from the backend; nothing is cached between calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::operation_poller::OperationPoller;
use super::report_renderer::{self, RenderOptions};
use super::revision_merger;
use crate::domain::errors::{ErrorDetails, InvestigationError, InvestigationResult};
use crate::domain::models::{Config, Investigation, InvestigationPath};
use crate::domain::ports::{InvestigationBackend, ListRequest};

/// Arguments of a fetch call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub project_id: String,
    #[serde(default)]
    pub investigation_id: Option<String>,
    #[serde(default)]
    pub revision_id: Option<String>,
    /// Only used when listing.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub page_token: Option<String>,
}

/// Arguments of a create call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub title: String,
    pub project_id: String,
    pub description: String,
    #[serde(default)]
    pub relevant_resources: Vec<String>,
    /// RFC 3339 timestamp of when the issue started.
    #[serde(default)]
    pub start_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub project_id: String,
    pub investigation_id: String,
    pub revision_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddObservationRequest {
    pub project_id: String,
    pub investigation_id: String,
    pub observation: String,
    #[serde(default)]
    pub relevant_resources: Vec<String>,
}

/// A snapshot together with its rendered markdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestigationReport {
    pub investigation: Investigation,
    pub markdown: String,
}

impl InvestigationReport {
    fn new(investigation: Investigation, options: RenderOptions) -> Self {
        let markdown = report_renderer::render(&investigation, options);
        Self {
            investigation,
            markdown,
        }
    }
}

pub struct InvestigationClient<B: InvestigationBackend> {
    backend: Arc<B>,
    poller: OperationPoller,
    page_size: u32,
}

impl<B: InvestigationBackend> InvestigationClient<B> {
    pub fn new(backend: Arc<B>, config: &Config) -> Self {
        Self::with_poller(
            backend,
            OperationPoller::new(config.polling.clone()),
            config.page_size,
        )
    }

    pub const fn with_poller(backend: Arc<B>, poller: OperationPoller, page_size: u32) -> Self {
        Self {
            backend,
            poller,
            page_size,
        }
    }

    /// Fetch one investigation, or list investigations when no id is given.
    #[instrument(skip(self), fields(project = %request.project_id))]
    pub async fn fetch(&self, request: FetchRequest) -> InvestigationResult<String> {
        let path = InvestigationPath::new(
            request.project_id.as_str(),
            request.investigation_id.as_deref(),
            request.revision_id.as_deref(),
        )?;
        let page_token = request.page_token.filter(|t| !t.trim().is_empty());

        if path.investigation_id().is_some() {
            if page_token.is_some() {
                return Err(InvestigationError::InvalidArgument(
                    "page_token cannot be combined with investigation_id".to_string(),
                ));
            }
            let name = if path.revision_id().is_some() {
                path.revision_name()?
            } else {
                path.investigation_name()?
            };
            let investigation = self.backend.get(&name).await?;
            return Ok(report_renderer::render(
                &investigation,
                RenderOptions::default(),
            ));
        }

        let filter = request
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| format!("title:\"{}\"", t.replace('"', "\\\"")));
        let page = self
            .backend
            .list(ListRequest {
                parent: path.parent(),
                filter,
                page_size: Some(request.page_size.unwrap_or(self.page_size)),
                page_token,
            })
            .await?;

        info!(count = page.investigations.len(), "listed investigations");
        Ok(report_renderer::render_list(
            &page.investigations,
            page.next_page_token.as_deref(),
        ))
    }

    /// Open a new investigation.
    #[instrument(skip(self, request), fields(project = %request.project_id, title = %request.title))]
    pub async fn create(&self, request: CreateRequest) -> InvestigationResult<InvestigationReport> {
        validate_resources(&request.relevant_resources)?;
        let start_time = request
            .start_time
            .as_deref()
            .map(parse_start_time)
            .transpose()?;
        let path = InvestigationPath::new(request.project_id.as_str(), None, None)?;

        let draft = Investigation::draft(
            request.title,
            path.project_id(),
            request.description,
            request.relevant_resources,
            start_time,
        );
        let created = self.backend.create(&path.parent(), &draft).await?;

        info!(investigation = %created.name, "investigation created");
        Ok(InvestigationReport::new(created, RenderOptions::summary()))
    }

    /// Run the analysis of a revision and wait for it to finish.
    #[instrument(skip(self, request), fields(investigation = %request.investigation_id, revision = %request.revision_id))]
    pub async fn run(&self, request: RunRequest) -> InvestigationResult<InvestigationReport> {
        let path = InvestigationPath::new(
            request.project_id.as_str(),
            Some(&request.investigation_id),
            Some(&request.revision_id),
        )?;
        let revision_name = path.revision_name()?;
        let investigation_name = path.investigation_name()?;

        let operation = self.backend.run_revision(&revision_name).await?;
        info!(operation = %operation.name, "analysis started");

        let backend = self.backend.as_ref();
        let operation_name = operation.name.as_str();
        match self
            .poller
            .poll(move || backend.get_operation(operation_name))
            .await
        {
            Ok(_) => {}
            Err(InvestigationError::Timeout { attempts, details }) => {
                let details = self.timeout_details(&investigation_name, details).await;
                return Err(InvestigationError::Timeout { attempts, details });
            }
            Err(err) => return Err(err),
        }

        let investigation = self.backend.get(&investigation_name).await?;
        Ok(InvestigationReport::new(
            investigation,
            RenderOptions::default(),
        ))
    }

    /// Append an observation to the latest revision as a new revision.
    #[instrument(skip(self, request), fields(investigation = %request.investigation_id))]
    pub async fn add_observation(
        &self,
        request: AddObservationRequest,
    ) -> InvestigationResult<InvestigationReport> {
        if request.observation.trim().is_empty() {
            return Err(InvestigationError::InvalidArgument(
                "observation must not be empty".to_string(),
            ));
        }
        validate_resources(&request.relevant_resources)?;

        let path = InvestigationPath::new(
            request.project_id.as_str(),
            Some(&request.investigation_id),
            None,
        )?;
        let investigation_name = path.investigation_name()?;

        let latest = self.backend.get(&investigation_name).await?;
        let revision = revision_merger::merge(
            Some(&latest),
            &request.observation,
            &request.relevant_resources,
        )
        .ok_or_else(|| {
            InvestigationError::PayloadCreationFailed(format!(
                "no snapshot available for {investigation_name}"
            ))
        })?;

        let created = self
            .backend
            .create_revision(&investigation_name, &revision)
            .await?;
        info!(revision = ?created.revision, "revision created");
        Ok(InvestigationReport::new(created, RenderOptions::summary()))
    }

    /// Timeout details enriched with the latest snapshot, when it can be read.
    async fn timeout_details(
        &self,
        investigation_name: &str,
        details: Option<ErrorDetails>,
    ) -> Option<ErrorDetails> {
        let snapshot = match self.backend.get(investigation_name).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "could not refetch snapshot after timeout");
                return details;
            }
        };
        let Ok(snapshot) = serde_json::to_value(snapshot) else {
            return details;
        };

        let mut description = match details {
            Some(ErrorDetails::Description(Value::Object(map))) => map,
            Some(ErrorDetails::Description(other) | ErrorDetails::Backend(other)) => {
                Map::from_iter([("lastStatus".to_string(), other)])
            }
            None => Map::new(),
        };
        description.insert("snapshot".to_string(), snapshot);
        Some(ErrorDetails::Description(Value::Object(description)))
    }
}

/// Resource references must be full resource names such as
/// `//run.googleapis.com/projects/p/services/s`.
fn validate_resources(resources: &[String]) -> InvestigationResult<()> {
    for resource in resources {
        let valid = resource
            .strip_prefix("//")
            .is_some_and(|rest| !rest.trim().is_empty() && !rest.starts_with('/'));
        if !valid {
            return Err(InvestigationError::InvalidArgument(format!(
                "invalid resource reference '{resource}': expected a full resource name starting with '//'"
            )));
        }
    }
    Ok(())
}

fn parse_start_time(value: &str) -> InvestigationResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            InvestigationError::InvalidArgument(format!(
                "start_time '{value}' is not an RFC 3339 timestamp: {e}"
            ))
        })
}
