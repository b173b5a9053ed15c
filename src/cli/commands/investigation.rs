//! Investigation CLI commands.
//!
//! Thin adapters from parsed arguments to [`InvestigationClient`] requests.

use crate::cli::output::ReportOutput;
use crate::cli::types::{AddObservationArgs, CreateArgs, FetchArgs, RunArgs};
use crate::domain::errors::InvestigationResult;
use crate::domain::ports::InvestigationBackend;
use crate::services::{
    AddObservationRequest, CreateRequest, FetchRequest, InvestigationClient, RunRequest,
};

pub async fn create<B: InvestigationBackend>(
    client: &InvestigationClient<B>,
    args: CreateArgs,
) -> InvestigationResult<ReportOutput> {
    let report = client
        .create(CreateRequest {
            title: args.title,
            project_id: args.project,
            description: args.description,
            relevant_resources: args.resource,
            start_time: args.start_time,
        })
        .await?;
    Ok(report.into())
}

pub async fn fetch<B: InvestigationBackend>(
    client: &InvestigationClient<B>,
    args: FetchArgs,
) -> InvestigationResult<ReportOutput> {
    let markdown = client
        .fetch(FetchRequest {
            project_id: args.project,
            investigation_id: args.investigation,
            revision_id: args.revision,
            title: args.title,
            page_size: args.page_size,
            page_token: args.page_token,
        })
        .await?;
    Ok(markdown.into())
}

pub async fn run<B: InvestigationBackend>(
    client: &InvestigationClient<B>,
    args: RunArgs,
) -> InvestigationResult<ReportOutput> {
    let report = client
        .run(RunRequest {
            project_id: args.project,
            investigation_id: args.investigation,
            revision_id: args.revision,
        })
        .await?;
    Ok(report.into())
}

pub async fn add_observation<B: InvestigationBackend>(
    client: &InvestigationClient<B>,
    args: AddObservationArgs,
) -> InvestigationResult<ReportOutput> {
    let report = client
        .add_observation(AddObservationRequest {
            project_id: args.project,
            investigation_id: args.investigation,
            observation: args.observation,
            relevant_resources: args.resource,
        })
        .await?;
    Ok(report.into())
}
