//! Markdown rendering of investigation snapshots.
//!
//! The report shape is stable regardless of how complete the snapshot is:
//! missing values render as `N/A` and empty collections render an explicit
//! message instead of disappearing. Downstream agents parse the
//! `**Investigation Path**` and `**Revision Path**` lines, so those labels must
//! not change.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::models::{
    Investigation, InvestigationPath, Observation, PRIMARY_OBSERVATION_ID, PROJECT_OBSERVATION_ID,
};

/// Console page showing a single investigation.
pub const CONSOLE_BASE_URL: &str =
    "https://console.cloud.google.com/troubleshooting/investigations/details";

const NOT_AVAILABLE: &str = "N/A";
const SECTION_SEPARATOR: &str = "\n\n";

/// Presentation switches for [`render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Hidden right after create/add-observation, before any analysis ran.
    pub show_observations_and_hypotheses: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_observations_and_hypotheses: true,
        }
    }
}

impl RenderOptions {
    pub const fn summary() -> Self {
        Self {
            show_observations_and_hypotheses: false,
        }
    }
}

/// Render a full report.
pub fn render(investigation: &Investigation, options: RenderOptions) -> String {
    let mut sections = vec![
        render_issue(investigation),
        render_user_observations(investigation),
    ];
    if options.show_observations_and_hypotheses {
        sections.push(render_observations(investigation));
        sections.push(render_hypotheses(investigation));
    }
    sections.push(render_link(investigation));

    sections
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR)
}

pub fn render_issue(investigation: &Investigation) -> String {
    let title = or_na(&investigation.title);
    let name = or_na(&investigation.name);
    let revision = investigation
        .revision
        .as_deref()
        .filter(|r| !r.is_empty())
        .unwrap_or(NOT_AVAILABLE);
    let start_time = investigation
        .start_time()
        .map_or_else(|| NOT_AVAILABLE.to_string(), format_time);
    let description = investigation
        .primary_observation()
        .map(|o| o.text.as_str())
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(NOT_AVAILABLE);

    format!(
        "# Investigation: {title}\n\n\
         **Investigation Path**: {name}\n\
         **Revision Path**: {revision}\n\
         **State**: {state}\n\
         **Start Time**: {start_time}\n\n\
         ## Issue\n\
         {description}",
        state = investigation.execution_state.label(),
    )
}

/// Additional user-authored observations. Empty when there are none.
pub fn render_user_observations(investigation: &Investigation) -> String {
    let Some(observations) = &investigation.observations else {
        return String::new();
    };

    let lines: Vec<String> = observations
        .iter()
        .filter(|(id, obs)| {
            obs.is_user()
                && id.as_str() != PRIMARY_OBSERVATION_ID
                && id.as_str() != PROJECT_OBSERVATION_ID
        })
        .map(|(id, obs)| {
            let label = obs.title.as_deref().unwrap_or(id);
            format!("- **{label}**: {}", obs.text)
        })
        .collect();

    if lines.is_empty() {
        return String::new();
    }
    format!("## User Observations\n\n{}", lines.join("\n"))
}

/// Observations produced by the analysis.
pub fn render_observations(investigation: &Investigation) -> String {
    let analysis: Vec<(&String, &Observation)> = investigation
        .observations
        .iter()
        .flatten()
        .filter(|(_, obs)| !obs.is_user())
        .collect();

    let mut out = format!("## Relevant Observations ({})", analysis.len());
    if analysis.is_empty() {
        out.push_str("\n\nNo observations found.");
        return out;
    }

    for (index, (id, obs)) in analysis.iter().enumerate() {
        let heading = obs.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(id);
        out.push_str(&format!(
            "\n\n### {}. {heading}\n**Type**: {}",
            index + 1,
            obs.observation_type.label()
        ));
        if !obs.text.trim().is_empty() {
            out.push('\n');
            out.push_str(obs.text.trim_end());
        }
        if !obs.relevant_resources.is_empty() {
            out.push_str("\n**Relevant Resources**:");
            for resource in &obs.relevant_resources {
                out.push_str("\n- ");
                out.push_str(resource);
            }
        }
    }
    out
}

pub fn render_hypotheses(investigation: &Investigation) -> String {
    let hypotheses = &investigation.hypotheses;
    let mut out = format!("## Hypotheses ({})", hypotheses.len());
    if hypotheses.is_empty() {
        out.push_str("\n\nNo hypotheses found.");
        return out;
    }

    for (index, hypothesis) in hypotheses.iter().enumerate() {
        out.push_str(&format!(
            "\n\n### Hypothesis {}: {}",
            index + 1,
            or_na(&hypothesis.title)
        ));
        if !hypothesis.description.trim().is_empty() {
            out.push('\n');
            out.push_str(hypothesis.description.trim_end());
        }
        if !hypothesis.supporting_observation_ids.is_empty() {
            out.push_str("\n**Supporting Observations**: ");
            out.push_str(&hypothesis.supporting_observation_ids.join(", "));
        }
    }
    out
}

pub fn render_link(investigation: &Investigation) -> String {
    let link = investigation
        .path()
        .and_then(|path| link_for(&path))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    format!("**Console Link**: {link}")
}

/// Console deep link for an investigation.
pub fn console_link(project_id: &str, investigation_id: &str) -> String {
    format!("{CONSOLE_BASE_URL}/{investigation_id}?project={project_id}")
}

fn link_for(path: &InvestigationPath) -> Option<String> {
    path.investigation_id()
        .map(|id| console_link(path.project_id(), id))
}

/// Render one page of a list call.
pub fn render_list(investigations: &[Investigation], next_page_token: Option<&str>) -> String {
    if investigations.is_empty() {
        return "No investigations found.".to_string();
    }

    let mut out = investigations
        .iter()
        .map(render_list_item)
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR);

    if let Some(token) = next_page_token.filter(|t| !t.is_empty()) {
        out.push_str(SECTION_SEPARATOR);
        out.push_str(&format!("**Next Page Token**: {token}"));
    }
    out
}

fn render_list_item(investigation: &Investigation) -> String {
    let id = investigation.investigation_id().unwrap_or(NOT_AVAILABLE);
    let link = investigation
        .path()
        .and_then(|path| link_for(&path))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    format!(
        "**Investigation ID**: {id}\n\
         **Title**: {title}\n\
         **State**: {state}\n\
         **Link**: {link}",
        title = or_na(&investigation.title),
        state = investigation.execution_state.label(),
    )
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() {
        NOT_AVAILABLE
    } else {
        value
    }
}

fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}
