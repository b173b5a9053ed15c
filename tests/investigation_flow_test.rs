//! End-to-end session flows against the in-memory backend
//!
//! Exercises create, fetch, run and add-observation through the
//! `InvestigationClient`, the same path the CLI and the MCP server take.

mod common;

use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

use common::instant_client;
use troubleshooter::domain::errors::{ErrorDetails, ErrorKind, RemoteCall};
use troubleshooter::domain::models::{
    ExecutionState, Hypothesis, Investigation, Observation, ObservationType, ObserverType,
    PollingConfig, PRIMARY_OBSERVATION_ID,
};
use troubleshooter::infrastructure::cloud_assist::{MockAnalysis, MockInvestigationBackend};
use troubleshooter::services::{
    AddObservationRequest, CreateRequest, FetchRequest, InvestigationClient, RunRequest,
};

const RESOURCE: &str = "//service.googleapis.com/a/b";

fn create_request() -> CreateRequest {
    CreateRequest {
        title: "[Gemini CLI] X".to_string(),
        project_id: "proj1".to_string(),
        description: "desc".to_string(),
        relevant_resources: vec![RESOURCE.to_string()],
        start_time: Some("2025-01-01T00:00:00Z".to_string()),
    }
}

fn analysis() -> MockAnalysis {
    MockAnalysis {
        observations: vec![Observation {
            id: "diag.logs.1".to_string(),
            observation_type: ObservationType::CloudLog,
            observer_type: ObserverType::Diagnostic,
            title: Some("OOMKilled containers".to_string()),
            text: "Pods restarted 14 times".to_string(),
            ..Observation::default()
        }],
        hypotheses: vec![Hypothesis {
            title: "Memory limit too low".to_string(),
            description: "The checkout service exceeds its memory limit under load.".to_string(),
            supporting_observation_ids: vec!["diag.logs.1".to_string()],
            ..Hypothesis::default()
        }],
    }
}

fn client(
    backend: MockInvestigationBackend,
) -> (InvestigationClient<MockInvestigationBackend>, Arc<MockInvestigationBackend>) {
    let backend = Arc::new(backend);
    let (client, _sleeper) = instant_client(backend.clone(), PollingConfig::default());
    (client, backend)
}

#[tokio::test]
async fn test_create_builds_expected_draft() {
    let (client, _backend) = client(MockInvestigationBackend::new());

    let report = client.create(create_request()).await.unwrap();
    let investigation = &report.investigation;

    assert_eq!(investigation.title, "[Gemini CLI] X");
    let primary = investigation.primary_observation().unwrap();
    assert_eq!(primary.text, "desc");
    assert_eq!(primary.relevant_resources, vec![RESOURCE.to_string()]);
    assert_eq!(
        investigation.start_time().map(|t| t.to_rfc3339()),
        Some("2025-01-01T00:00:00+00:00".to_string())
    );
    assert_eq!(investigation.project_observation().unwrap().text, "proj1");
    assert_eq!(investigation.user_observation_count(), 2);

    assert!(report.markdown.contains(
        "**Investigation Path**: projects/proj1/locations/global/investigations/inv-1"
    ));
    assert!(report.markdown.contains("## Issue\ndesc"));
    assert!(!report.markdown.contains("## Hypotheses"));
}

#[tokio::test]
async fn test_full_session() {
    let (client, backend) = client(
        MockInvestigationBackend::new()
            .with_pending_polls(2)
            .with_analysis(analysis()),
    );

    let created = client.create(create_request()).await.unwrap();
    let path = created.investigation.path().unwrap();
    let investigation_id = path.investigation_id().unwrap().to_string();

    let ran = client
        .run(RunRequest {
            project_id: "proj1".to_string(),
            investigation_id: investigation_id.clone(),
            revision_id: "rev-1".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(ran.investigation.execution_state, ExecutionState::Completed);
    assert!(ran.markdown.contains("## Relevant Observations (1)"));
    assert!(ran.markdown.contains("### Hypothesis 1: Memory limit too low"));
    assert_eq!(backend.call_count(RemoteCall::GetOperation).await, 3);

    // The refetch after polling reads the investigation, not the revision
    let calls = backend.calls().await;
    let last_poll = calls
        .iter()
        .rposition(|(call, _)| *call == RemoteCall::GetOperation)
        .unwrap();
    assert_eq!(
        calls[last_poll + 1],
        (
            RemoteCall::Get,
            "projects/proj1/locations/global/investigations/inv-1".to_string()
        )
    );

    let revised = client
        .add_observation(AddObservationRequest {
            project_id: "proj1".to_string(),
            investigation_id: investigation_id.clone(),
            observation: "Started after the 10:00 deploy".to_string(),
            relevant_resources: vec![
                RESOURCE.to_string(),
                "//run.googleapis.com/projects/proj1/services/checkout".to_string(),
            ],
        })
        .await
        .unwrap();

    let primary = revised.investigation.primary_observation().unwrap();
    assert_eq!(primary.text, "desc\nStarted after the 10:00 deploy");
    assert_eq!(primary.relevant_resources.len(), 2);
    assert_eq!(revised.investigation.user_observation_count(), 2);
    assert_eq!(revised.investigation.execution_state, ExecutionState::Modified);
    // Analysis from the previous run is carried into the new revision
    assert!(revised.investigation.observation("diag.logs.1").is_some());

    let fetched = client
        .fetch(FetchRequest {
            project_id: "proj1".to_string(),
            investigation_id: Some(investigation_id),
            ..FetchRequest::default()
        })
        .await
        .unwrap();
    assert!(fetched.contains("Started after the 10:00 deploy"));
}

#[tokio::test]
async fn test_fetch_lists_with_title_filter_and_paging() {
    let (client, _backend) = client(MockInvestigationBackend::new());
    for title in ["Checkout errors", "Latency spike", "Checkout errors again"] {
        client
            .create(CreateRequest {
                title: title.to_string(),
                project_id: "proj1".to_string(),
                description: "desc".to_string(),
                ..CreateRequest::default()
            })
            .await
            .unwrap();
    }

    let first = client
        .fetch(FetchRequest {
            project_id: "proj1".to_string(),
            title: Some("Checkout".to_string()),
            page_size: Some(1),
            ..FetchRequest::default()
        })
        .await
        .unwrap();
    assert!(first.contains("**Title**: Checkout errors"));
    assert!(!first.contains("Latency spike"));
    assert!(first.contains("**Next Page Token**: 1"));

    let second = client
        .fetch(FetchRequest {
            project_id: "proj1".to_string(),
            title: Some("Checkout".to_string()),
            page_size: Some(1),
            page_token: Some("1".to_string()),
            ..FetchRequest::default()
        })
        .await
        .unwrap();
    assert!(second.contains("**Title**: Checkout errors again"));
    assert!(!second.contains("**Next Page Token**"));

    let other_project = client
        .fetch(FetchRequest {
            project_id: "proj2".to_string(),
            ..FetchRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(other_project, "No investigations found.");
}

#[tokio::test]
async fn test_fetch_rejects_page_token_with_id() {
    let (client, backend) = client(MockInvestigationBackend::new());

    let err = client
        .fetch(FetchRequest {
            project_id: "proj1".to_string(),
            investigation_id: Some("inv-1".to_string()),
            page_token: Some("abc".to_string()),
            ..FetchRequest::default()
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(backend.calls().await.is_empty());
}

#[tokio::test]
async fn test_run_times_out_with_snapshot_details() {
    let (client, backend) = client(MockInvestigationBackend::new().with_pending_polls(10));
    let polling = PollingConfig {
        max_attempts: 3,
        ..PollingConfig::default()
    };
    let (client_with_budget, sleeper) = instant_client(backend.clone(), polling);

    client.create(create_request()).await.unwrap();
    let err = client_with_budget
        .run(RunRequest {
            project_id: "proj1".to_string(),
            investigation_id: "inv-1".to_string(),
            revision_id: "rev-1".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(backend.call_count(RemoteCall::GetOperation).await, 3);
    assert_eq!(sleeper.delays.lock().unwrap().len(), 3);

    let Some(ErrorDetails::Description(details)) = err.details() else {
        panic!("expected description details, got {:?}", err.details());
    };
    assert_eq!(details["lastStatus"]["done"], json!(false));
    assert_eq!(
        details["snapshot"]["executionState"],
        "INVESTIGATION_EXECUTION_STATE_RUNNING"
    );
}

#[tokio::test]
async fn test_run_surfaces_operation_error() {
    let (client, _backend) = client(
        MockInvestigationBackend::new()
            .with_operation_error(json!({"code": 9, "message": "analysis quota exhausted"})),
    );
    client.create(create_request()).await.unwrap();

    let err = client
        .run(RunRequest {
            project_id: "proj1".to_string(),
            investigation_id: "inv-1".to_string(),
            revision_id: "rev-1".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::OperationError);
    let report = err.report().to_json();
    assert_eq!(report["details"]["payload"]["message"], "analysis quota exhausted");
}

#[tokio::test]
async fn test_add_observation_creates_primary_when_missing() {
    let (client, backend) = client(MockInvestigationBackend::new());
    backend
        .seed(Investigation {
            name: "projects/proj1/locations/global/investigations/legacy".to_string(),
            title: "Legacy".to_string(),
            observations: Some(BTreeMap::new()),
            ..Investigation::default()
        })
        .await;

    let revised = client
        .add_observation(AddObservationRequest {
            project_id: "proj1".to_string(),
            investigation_id: "legacy".to_string(),
            observation: "first note".to_string(),
            relevant_resources: vec![],
        })
        .await
        .unwrap();

    let primary = revised.investigation.observation(PRIMARY_OBSERVATION_ID).unwrap();
    assert_eq!(primary.text, "first note");
    assert_eq!(revised.investigation.user_observation_count(), 1);
}

#[tokio::test]
async fn test_remote_failure_keeps_backend_body() {
    let body = json!({"error": {"code": 403, "message": "Permission denied on project proj1"}});
    let (client, _backend) =
        client(MockInvestigationBackend::new().failing(RemoteCall::Create, body.clone()));

    let err = client.create(create_request()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RemoteCallFailed);
    assert_eq!(err.details(), Some(&ErrorDetails::Backend(body)));
}

#[tokio::test]
async fn test_invalid_inputs_are_rejected_before_any_call() {
    let (client, backend) = client(MockInvestigationBackend::new());

    let bad_resource = client
        .create(CreateRequest {
            relevant_resources: vec!["service.googleapis.com/a".to_string()],
            ..create_request()
        })
        .await
        .unwrap_err();
    assert_eq!(bad_resource.kind(), ErrorKind::InvalidArgument);

    let bad_time = client
        .create(CreateRequest {
            start_time: Some("yesterday".to_string()),
            ..create_request()
        })
        .await
        .unwrap_err();
    assert_eq!(bad_time.kind(), ErrorKind::InvalidArgument);

    let empty_observation = client
        .add_observation(AddObservationRequest {
            project_id: "proj1".to_string(),
            investigation_id: "inv-1".to_string(),
            observation: "  ".to_string(),
            relevant_resources: vec![],
        })
        .await
        .unwrap_err();
    assert_eq!(empty_observation.kind(), ErrorKind::InvalidArgument);

    assert!(backend.calls().await.is_empty());
}
