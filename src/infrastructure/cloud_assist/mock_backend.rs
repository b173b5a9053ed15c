//! In-memory investigation backend for testing

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::domain::errors::{ErrorDetails, InvestigationError, InvestigationResult, RemoteCall};
use crate::domain::models::{
    ExecutionState, Hypothesis, Investigation, InvestigationPage, Observation, Operation,
    RevisionRequest,
};
use crate::domain::ports::{InvestigationBackend, ListRequest};

/// Analysis applied to an investigation when a run operation completes.
#[derive(Debug, Clone, Default)]
pub struct MockAnalysis {
    pub observations: Vec<Observation>,
    pub hypotheses: Vec<Hypothesis>,
}

#[derive(Debug, Default)]
struct MockState {
    /// Latest snapshot per investigation name.
    investigations: BTreeMap<String, Investigation>,
    /// Snapshot per revision name.
    revisions: HashMap<String, Investigation>,
    /// Remaining pending polls and target investigation per operation.
    operations: HashMap<String, (u32, String)>,
    calls: Vec<(RemoteCall, String)>,
    next_id: u32,
}

/// Backend keeping investigations in memory.
///
/// Names follow the real resource layout so paths parsed from responses are
/// usable in follow-up calls.
#[derive(Debug, Default)]
pub struct MockInvestigationBackend {
    state: RwLock<MockState>,
    pending_polls: u32,
    operation_error: Option<Value>,
    analysis: MockAnalysis,
    failures: Vec<(RemoteCall, Value)>,
}

impl MockInvestigationBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of "not done" statuses reported before an operation completes.
    #[must_use]
    pub const fn with_pending_polls(mut self, pending_polls: u32) -> Self {
        self.pending_polls = pending_polls;
        self
    }

    /// Make every operation finish with this error payload.
    #[must_use]
    pub fn with_operation_error(mut self, error: Value) -> Self {
        self.operation_error = Some(error);
        self
    }

    #[must_use]
    pub fn with_analysis(mut self, analysis: MockAnalysis) -> Self {
        self.analysis = analysis;
        self
    }

    /// Reject every call of the given kind with a backend error body.
    #[must_use]
    pub fn failing(mut self, call: RemoteCall, body: Value) -> Self {
        self.failures.push((call, body));
        self
    }

    /// Calls received so far, in order, with their resource argument.
    pub async fn calls(&self) -> Vec<(RemoteCall, String)> {
        self.state.read().await.calls.clone()
    }

    pub async fn call_count(&self, call: RemoteCall) -> usize {
        self.state
            .read()
            .await
            .calls
            .iter()
            .filter(|(c, _)| *c == call)
            .count()
    }

    /// Insert a snapshot directly, bypassing `create`.
    pub async fn seed(&self, investigation: Investigation) {
        let mut state = self.state.write().await;
        if let Some(revision) = &investigation.revision {
            state
                .revisions
                .insert(revision.clone(), investigation.clone());
        }
        state
            .investigations
            .insert(investigation.name.clone(), investigation);
    }

    async fn record(&self, call: RemoteCall, target: &str) -> InvestigationResult<()> {
        self.state
            .write()
            .await
            .calls
            .push((call, target.to_string()));

        match self.failures.iter().find(|(c, _)| *c == call) {
            Some((_, body)) => Err(InvestigationError::RemoteCallFailed {
                call,
                message: body["error"]["message"]
                    .as_str()
                    .unwrap_or("request rejected")
                    .to_string(),
                details: Some(ErrorDetails::Backend(body.clone())),
            }),
            None => Ok(()),
        }
    }
}

fn not_found(call: RemoteCall, name: &str) -> InvestigationError {
    let body = json!({
        "error": {
            "code": 404,
            "message": format!("Resource '{name}' was not found"),
            "status": "NOT_FOUND"
        }
    });
    InvestigationError::RemoteCallFailed {
        call,
        message: format!("Resource '{name}' was not found"),
        details: Some(ErrorDetails::Backend(body)),
    }
}

/// Extracts `X` from a `title:"X"` filter.
fn title_filter(filter: &str) -> Option<&str> {
    filter
        .strip_prefix("title:\"")
        .and_then(|rest| rest.strip_suffix('"'))
}

#[async_trait]
impl InvestigationBackend for MockInvestigationBackend {
    async fn list(&self, request: ListRequest) -> InvestigationResult<InvestigationPage> {
        self.record(RemoteCall::List, &request.parent).await?;
        let state = self.state.read().await;

        let prefix = format!("{}/investigations/", request.parent);
        let title = request.filter.as_deref().and_then(title_filter);
        let matching: Vec<&Investigation> = state
            .investigations
            .values()
            .filter(|inv| inv.name.starts_with(&prefix))
            .filter(|inv| title.map_or(true, |t| inv.title.contains(t)))
            .collect();

        let offset = request
            .page_token
            .as_deref()
            .and_then(|t| t.parse::<usize>().ok())
            .unwrap_or(0);
        let page_size = request.page_size.map_or(usize::MAX, |s| s as usize).max(1);
        let end = offset.saturating_add(page_size).min(matching.len());

        Ok(InvestigationPage {
            investigations: matching
                .get(offset..end)
                .unwrap_or_default()
                .iter()
                .map(|inv| (*inv).clone())
                .collect(),
            next_page_token: (end < matching.len()).then(|| end.to_string()),
        })
    }

    async fn get(&self, name: &str) -> InvestigationResult<Investigation> {
        self.record(RemoteCall::Get, name).await?;
        let state = self.state.read().await;
        state
            .revisions
            .get(name)
            .or_else(|| state.investigations.get(name))
            .cloned()
            .ok_or_else(|| not_found(RemoteCall::Get, name))
    }

    async fn create(
        &self,
        parent: &str,
        body: &Investigation,
    ) -> InvestigationResult<Investigation> {
        self.record(RemoteCall::Create, parent).await?;
        let mut state = self.state.write().await;

        state.next_id += 1;
        let name = format!("{parent}/investigations/inv-{}", state.next_id);
        let now = Utc::now();
        let created = Investigation {
            name: name.clone(),
            revision: Some(format!("{name}/revisions/rev-1")),
            create_time: Some(now),
            update_time: Some(now),
            ..body.clone()
        };

        if let Some(revision) = &created.revision {
            state.revisions.insert(revision.clone(), created.clone());
        }
        state.investigations.insert(name, created.clone());
        Ok(created)
    }

    async fn run_revision(&self, name: &str) -> InvestigationResult<Operation> {
        self.record(RemoteCall::RunRevision, name).await?;
        let mut state = self.state.write().await;

        let investigation = state
            .revisions
            .get(name)
            .map(|inv| inv.name.clone())
            .ok_or_else(|| not_found(RemoteCall::RunRevision, name))?;

        if let Some(latest) = state.investigations.get_mut(&investigation) {
            latest.execution_state = ExecutionState::Running;
        }

        state.next_id += 1;
        let parent = investigation
            .split("/investigations/")
            .next()
            .unwrap_or_default();
        let operation = format!("{parent}/operations/op-{}", state.next_id);
        state
            .operations
            .insert(operation.clone(), (self.pending_polls, investigation));

        Ok(Operation {
            name: operation,
            ..Operation::default()
        })
    }

    async fn get_operation(&self, name: &str) -> InvestigationResult<Operation> {
        self.record(RemoteCall::GetOperation, name).await?;
        let mut state = self.state.write().await;

        let (remaining, investigation) = state
            .operations
            .get_mut(name)
            .map(|(remaining, inv)| {
                let current = *remaining;
                *remaining = remaining.saturating_sub(1);
                (current, inv.clone())
            })
            .ok_or_else(|| not_found(RemoteCall::GetOperation, name))?;

        if remaining > 0 {
            return Ok(Operation {
                name: name.to_string(),
                ..Operation::default()
            });
        }

        if let Some(latest) = state.investigations.get_mut(&investigation) {
            if self.operation_error.is_some() {
                latest.execution_state = ExecutionState::Failed;
            } else {
                latest.execution_state = ExecutionState::Completed;
                let observations = latest.observations.get_or_insert_with(BTreeMap::new);
                for observation in &self.analysis.observations {
                    observations.insert(observation.id.clone(), observation.clone());
                }
                latest.hypotheses.clone_from(&self.analysis.hypotheses);
            }
        }

        Ok(Operation {
            name: name.to_string(),
            done: true,
            error: self.operation_error.clone(),
            response: self
                .operation_error
                .is_none()
                .then(|| json!({ "name": investigation })),
            metadata: None,
        })
    }

    async fn create_revision(
        &self,
        parent: &str,
        body: &RevisionRequest,
    ) -> InvestigationResult<Investigation> {
        self.record(RemoteCall::CreateRevision, parent).await?;
        let mut state = self.state.write().await;

        if !state.investigations.contains_key(parent) {
            return Err(not_found(RemoteCall::CreateRevision, parent));
        }

        state.next_id += 1;
        let revision = format!("{parent}/revisions/rev-{}", state.next_id);
        let snapshot = Investigation {
            name: parent.to_string(),
            revision: Some(revision.clone()),
            update_time: Some(Utc::now()),
            execution_state: ExecutionState::Modified,
            ..body.snapshot().clone()
        };

        state.revisions.insert(revision, snapshot.clone());
        state
            .investigations
            .insert(parent.to_string(), snapshot.clone());
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ErrorKind;

    const PARENT: &str = "projects/proj1/locations/global";

    #[tokio::test]
    async fn test_create_assigns_names() {
        let backend = MockInvestigationBackend::new();
        let draft = Investigation::draft("t", "proj1", "d", vec![], None);

        let created = backend.create(PARENT, &draft).await.unwrap();
        assert_eq!(created.name, format!("{PARENT}/investigations/inv-1"));
        assert_eq!(
            created.revision.as_deref(),
            Some("projects/proj1/locations/global/investigations/inv-1/revisions/rev-1")
        );

        let fetched = backend.get(&created.name).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_get_missing_returns_backend_payload() {
        let backend = MockInvestigationBackend::new();
        let err = backend.get("projects/p/locations/global/investigations/x").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteCallFailed);
        assert!(matches!(err.details(), Some(ErrorDetails::Backend(_))));
    }

    #[tokio::test]
    async fn test_list_pages_and_filters() {
        let backend = MockInvestigationBackend::new();
        for title in ["alpha", "beta", "alpha two"] {
            let draft = Investigation::draft(title, "proj1", "d", vec![], None);
            backend.create(PARENT, &draft).await.unwrap();
        }

        let first = backend
            .list(ListRequest {
                parent: PARENT.to_string(),
                page_size: Some(2),
                ..ListRequest::default()
            })
            .await
            .unwrap();
        assert_eq!(first.investigations.len(), 2);
        assert_eq!(first.next_page_token.as_deref(), Some("2"));

        let filtered = backend
            .list(ListRequest {
                parent: PARENT.to_string(),
                filter: Some("title:\"alpha\"".to_string()),
                ..ListRequest::default()
            })
            .await
            .unwrap();
        assert_eq!(filtered.investigations.len(), 2);
        assert!(filtered.next_page_token.is_none());
    }

    #[tokio::test]
    async fn test_operation_completes_after_pending_polls() {
        let backend = MockInvestigationBackend::new().with_pending_polls(2);
        let draft = Investigation::draft("t", "proj1", "d", vec![], None);
        let created = backend.create(PARENT, &draft).await.unwrap();

        let op = backend
            .run_revision(created.revision.as_deref().unwrap())
            .await
            .unwrap();
        assert!(!backend.get_operation(&op.name).await.unwrap().done);
        assert!(!backend.get_operation(&op.name).await.unwrap().done);
        assert!(backend.get_operation(&op.name).await.unwrap().done);

        let latest = backend.get(&created.name).await.unwrap();
        assert_eq!(latest.execution_state, ExecutionState::Completed);
    }

    #[tokio::test]
    async fn test_failing_call_is_rejected() {
        let body = json!({"error": {"code": 403, "message": "denied", "status": "PERMISSION_DENIED"}});
        let backend = MockInvestigationBackend::new().failing(RemoteCall::List, body.clone());

        let err = backend
            .list(ListRequest {
                parent: PARENT.to_string(),
                ..ListRequest::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Remote call 'list' failed: denied");
        assert_eq!(err.details(), Some(&ErrorDetails::Backend(body)));
    }
}
