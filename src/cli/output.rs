//! Output formatting utilities for the CLI.

use serde::Serialize;
use serde_json::json;

use crate::domain::errors::InvestigationError;
use crate::domain::models::Investigation;
use crate::services::InvestigationReport;

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;
    fn to_json(&self) -> serde_json::Value;
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Markdown report, optionally with the snapshot it was rendered from.
#[derive(Debug, Serialize)]
pub struct ReportOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investigation: Option<Investigation>,
    pub markdown: String,
}

impl From<InvestigationReport> for ReportOutput {
    fn from(report: InvestigationReport) -> Self {
        Self {
            investigation: Some(report.investigation),
            markdown: report.markdown,
        }
    }
}

impl From<String> for ReportOutput {
    fn from(markdown: String) -> Self {
        Self {
            investigation: None,
            markdown,
        }
    }
}

impl CommandOutput for ReportOutput {
    fn to_human(&self) -> String {
        self.markdown.clone()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Render a command failure to stderr.
///
/// Investigation errors keep their kind and details; anything else (config,
/// logging setup) is reported with its context chain.
pub fn render_error(err: &anyhow::Error, json_mode: bool) -> String {
    match err.downcast_ref::<InvestigationError>() {
        Some(investigation_error) => {
            let report = investigation_error.report();
            if json_mode {
                serde_json::to_string_pretty(&report.to_json()).unwrap_or_default()
            } else {
                report.to_human()
            }
        }
        None if json_mode => {
            serde_json::to_string_pretty(&json!({ "message": format!("{err:#}") }))
                .unwrap_or_default()
        }
        None => format!("Error: {err:#}"),
    }
}

/// Print the error and exit with a non-zero status.
pub fn handle_error(err: &anyhow::Error, json_mode: bool) -> ! {
    eprintln!("{}", render_error(err, json_mode));
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{ErrorDetails, RemoteCall};
    use anyhow::Context;

    #[test]
    fn test_render_investigation_error_as_json() {
        let err = anyhow::Error::new(InvestigationError::RemoteCallFailed {
            call: RemoteCall::Get,
            message: "not found".to_string(),
            details: Some(ErrorDetails::Backend(json!({"error": {"code": 404}}))),
        });

        let rendered: serde_json::Value =
            serde_json::from_str(&render_error(&err, true)).unwrap();
        assert_eq!(rendered["kind"], "REMOTE_CALL_FAILED");
        assert_eq!(rendered["details"]["source"], "backend");
        assert_eq!(rendered["details"]["payload"]["error"]["code"], 404);
    }

    #[test]
    fn test_render_other_error_keeps_context() {
        let err = Err::<(), _>(anyhow::anyhow!("bad value"))
            .context("Failed to load configuration")
            .unwrap_err();

        let rendered = render_error(&err, false);
        assert!(rendered.starts_with("Error: Failed to load configuration"));
        assert!(rendered.contains("bad value"));
    }

    #[test]
    fn test_report_output_from_markdown() {
        let output = ReportOutput::from("# Investigation: x".to_string());
        assert_eq!(output.to_human(), "# Investigation: x");
        assert!(output.to_json().get("investigation").is_none());
    }
}
