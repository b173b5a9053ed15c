pub mod investigation_client;
pub mod operation_poller;
pub mod report_renderer;
pub mod revision_merger;

pub use investigation_client::{
    AddObservationRequest, CreateRequest, FetchRequest, InvestigationClient, InvestigationReport,
    RunRequest,
};
pub use operation_poller::{OperationPoller, PollState, PollableStatus};
pub use report_renderer::{render, render_list, RenderOptions};
