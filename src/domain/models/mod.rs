pub mod config;
pub mod investigation;
pub mod path;

pub use config::{ApiConfig, AuthConfig, Config, LoggingConfig, PollingConfig};
pub use investigation::{
    ExecutionState, Hypothesis, Investigation, InvestigationPage, Observation, ObservationType,
    ObserverType, Operation, RevisionRequest, TimeInterval, PRIMARY_OBSERVATION_ID,
    PROJECT_OBSERVATION_ID,
};
pub use path::InvestigationPath;
