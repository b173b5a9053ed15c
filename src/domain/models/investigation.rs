//! Investigation data model.
//!
//! These types mirror the backend's JSON payloads (camelCase on the wire).
//! Fields this client does not know about are kept in `extra` maps so a
//! snapshot fetched from the backend can be sent back as a revision without
//! dropping server data.
//!
//! The deprecated `timeRanges` observation field is folded into
//! `timeIntervals` while deserializing; nothing past this module ever sees it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

use super::path::{last_segment, InvestigationPath};

/// Observation id of the primary free-text user observation.
pub const PRIMARY_OBSERVATION_ID: &str = "user.input.text";

/// Observation id of the user's project context.
pub const PROJECT_OBSERVATION_ID: &str = "user.project";

/// Backend enum encoded as a string on the wire. Unknown values are kept
/// verbatim so they survive a fetch/revise round trip.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident {
            $($variant:ident => $wire:literal, $label:literal;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            /// Value not known to this client.
            Other(String),
        }

        impl $name {
            /// Wire representation.
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Other(value) => value,
                }
            }

            /// Short human-readable label.
            pub fn label(&self) -> &str {
                match self {
                    $(Self::$variant => $label,)+
                    Self::Other(value) => value,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                match value.as_str() {
                    $($wire => Self::$variant,)+
                    _ => Self::Other(value),
                }
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }
    };
}

wire_enum! {
    /// Execution state of an investigation. Display only.
    ExecutionState, default = Unspecified {
        Unspecified => "INVESTIGATION_EXECUTION_STATE_UNSPECIFIED", "Unspecified";
        Running => "INVESTIGATION_EXECUTION_STATE_RUNNING", "Running";
        Modified => "INVESTIGATION_EXECUTION_STATE_MODIFIED", "Modified";
        Failed => "INVESTIGATION_EXECUTION_STATE_FAILED", "Failed";
        Completed => "INVESTIGATION_EXECUTION_STATE_COMPLETED", "Completed";
    }
}

wire_enum! {
    /// Who produced an observation.
    ObserverType, default = Unspecified {
        Unspecified => "OBSERVER_TYPE_UNSPECIFIED", "Unspecified";
        Diagnostic => "OBSERVER_TYPE_DIAGNOSTIC", "Diagnostic";
        User => "OBSERVER_TYPE_USER", "User";
    }
}

wire_enum! {
    /// What kind of evidence an observation carries.
    ObservationType, default = Unspecified {
        Unspecified => "OBSERVATION_TYPE_UNSPECIFIED", "Unspecified";
        CloudLog => "OBSERVATION_TYPE_CLOUD_LOG", "Cloud Log";
        CloudMetric => "OBSERVATION_TYPE_CLOUD_METRIC", "Cloud Metric";
        CloudAlert => "OBSERVATION_TYPE_CLOUD_ALERT", "Cloud Alert";
        ConfigurationChange => "OBSERVATION_TYPE_CONFIGURATION_CHANGE", "Configuration Change";
        Knowledge => "OBSERVATION_TYPE_KNOWLEDGE", "Knowledge";
        TextDescription => "OBSERVATION_TYPE_TEXT_DESCRIPTION", "Text Description";
        StructuredInput => "OBSERVATION_TYPE_STRUCTURED_INPUT", "Structured Input";
    }
}

impl ExecutionState {
    pub fn is_unspecified(&self) -> bool {
        matches!(self, Self::Unspecified)
    }
}

/// Time window an observation applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeInterval {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl TimeInterval {
    pub const fn starting_at(start_time: DateTime<Utc>) -> Self {
        Self {
            start_time: Some(start_time),
            end_time: None,
        }
    }
}

/// A unit of evidence attached to an investigation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireObservation")]
pub struct Observation {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub observation_type: ObservationType,
    #[serde(default)]
    pub observer_type: ObserverType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub text: String,
    /// Ordered, no duplicates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relevant_resources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub time_intervals: Vec<TimeInterval>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Observation as it may appear on the wire, including deprecated fields.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireObservation {
    #[serde(default)]
    id: String,
    #[serde(default)]
    observation_type: ObservationType,
    #[serde(default)]
    observer_type: ObserverType,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    relevant_resources: Vec<String>,
    #[serde(default)]
    time_intervals: Vec<TimeInterval>,
    #[serde(default)]
    time_ranges: Vec<TimeInterval>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<WireObservation> for Observation {
    fn from(wire: WireObservation) -> Self {
        let mut time_intervals = wire.time_intervals;
        if !wire.time_ranges.is_empty() {
            debug!(
                observation = %wire.id,
                count = wire.time_ranges.len(),
                "normalizing deprecated timeRanges into timeIntervals"
            );
            for range in wire.time_ranges {
                if !time_intervals.contains(&range) {
                    time_intervals.push(range);
                }
            }
        }

        Self {
            id: wire.id,
            observation_type: wire.observation_type,
            observer_type: wire.observer_type,
            title: wire.title,
            text: wire.text,
            relevant_resources: wire.relevant_resources,
            time_intervals,
            extra: wire.extra,
        }
    }
}

impl Observation {
    /// The primary free-text observation written by the user.
    pub fn primary(
        text: impl Into<String>,
        relevant_resources: Vec<String>,
        start_time: Option<DateTime<Utc>>,
    ) -> Self {
        let mut resources = Vec::with_capacity(relevant_resources.len());
        for resource in relevant_resources {
            if !resources.contains(&resource) {
                resources.push(resource);
            }
        }

        Self {
            id: PRIMARY_OBSERVATION_ID.to_string(),
            observation_type: ObservationType::TextDescription,
            observer_type: ObserverType::User,
            text: text.into(),
            relevant_resources: resources,
            time_intervals: start_time.map(TimeInterval::starting_at).into_iter().collect(),
            ..Self::default()
        }
    }

    /// The user's project context.
    pub fn project(project_id: impl Into<String>) -> Self {
        Self {
            id: PROJECT_OBSERVATION_ID.to_string(),
            observation_type: ObservationType::StructuredInput,
            observer_type: ObserverType::User,
            text: project_id.into(),
            ..Self::default()
        }
    }

    pub fn is_user(&self) -> bool {
        self.observer_type == ObserverType::User
    }

    /// Earliest known start time.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.time_intervals.iter().filter_map(|i| i.start_time).min()
    }
}

/// A candidate root cause produced by the remote analysis.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hypothesis {
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "text")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supporting_observation_ids: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Full state of an investigation at some revision.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investigation {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub title: String,
    /// Name of the revision this snapshot belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "ExecutionState::is_unspecified")]
    pub execution_state: ExecutionState,
    /// `None` when the payload carried no observations mapping at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<BTreeMap<String, Observation>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hypotheses: Vec<Hypothesis>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Investigation {
    /// Snapshot submitted when opening a new investigation.
    pub fn draft(
        title: impl Into<String>,
        project_id: &str,
        description: impl Into<String>,
        relevant_resources: Vec<String>,
        start_time: Option<DateTime<Utc>>,
    ) -> Self {
        let observations = BTreeMap::from([
            (
                PROJECT_OBSERVATION_ID.to_string(),
                Observation::project(project_id),
            ),
            (
                PRIMARY_OBSERVATION_ID.to_string(),
                Observation::primary(description, relevant_resources, start_time),
            ),
        ]);

        Self {
            title: title.into(),
            observations: Some(observations),
            ..Self::default()
        }
    }

    pub fn observation(&self, id: &str) -> Option<&Observation> {
        self.observations.as_ref()?.get(id)
    }

    pub fn primary_observation(&self) -> Option<&Observation> {
        self.observation(PRIMARY_OBSERVATION_ID)
    }

    pub fn project_observation(&self) -> Option<&Observation> {
        self.observation(PROJECT_OBSERVATION_ID)
    }

    pub fn user_observation_count(&self) -> usize {
        self.observations
            .as_ref()
            .map_or(0, |obs| obs.values().filter(|o| o.is_user()).count())
    }

    /// Parsed form of `name`, if it is a well-formed investigation name.
    pub fn path(&self) -> Option<InvestigationPath> {
        InvestigationPath::parse(&self.name)
    }

    /// Investigation id, taken from `name`.
    pub fn investigation_id(&self) -> Option<&str> {
        if self.name.is_empty() {
            None
        } else {
            Some(last_segment(&self.name))
        }
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.primary_observation().and_then(Observation::start_time)
    }
}

/// Body for creating a new revision. Built only by the revision merger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevisionRequest {
    snapshot: Investigation,
}

impl RevisionRequest {
    pub(crate) const fn new(snapshot: Investigation) -> Self {
        Self { snapshot }
    }

    pub const fn snapshot(&self) -> &Investigation {
        &self.snapshot
    }

    pub fn into_snapshot(self) -> Investigation {
        self.snapshot
    }
}

/// Handle of a long-running backend operation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// One page of a list call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestigationPage {
    #[serde(default)]
    pub investigations: Vec<Investigation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}
