//! Domain errors for investigation sessions.
//!
//! Every failure surfaced to a caller maps to one closed [`InvestigationError`]
//! variant with a stable [`ErrorKind`] code, so the CLI and the MCP server can
//! render it as a structured result instead of a raw error chain.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Stable error codes, one per [`InvestigationError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidArgument,
    MissingIdentifier,
    AuthFailed,
    ApiDiscoveryFailed,
    RemoteCallFailed,
    OperationError,
    Timeout,
    PayloadCreationFailed,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::MissingIdentifier => "MISSING_IDENTIFIER",
            Self::AuthFailed => "AUTH_FAILED",
            Self::ApiDiscoveryFailed => "API_DISCOVERY_FAILED",
            Self::RemoteCallFailed => "REMOTE_CALL_FAILED",
            Self::OperationError => "OPERATION_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::PayloadCreationFailed => "PAYLOAD_CREATION_FAILED",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The backend call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteCall {
    List,
    Get,
    Create,
    CreateRevision,
    RunRevision,
    GetOperation,
}

impl RemoteCall {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Create => "create",
            Self::CreateRevision => "create_revision",
            Self::RunRevision => "run_revision",
            Self::GetOperation => "get_operation",
        }
    }
}

impl fmt::Display for RemoteCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic payload attached to an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", content = "payload", rename_all = "snake_case")]
pub enum ErrorDetails {
    /// Payload returned by the backend, kept verbatim.
    Backend(Value),
    /// Description assembled locally from known state.
    Description(Value),
}

/// Errors produced by the investigation session engine.
#[derive(Debug, Error)]
pub enum InvestigationError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    MissingIdentifier(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("API discovery failed: {0}")]
    ApiDiscoveryFailed(String),

    #[error("Remote call '{call}' failed: {message}")]
    RemoteCallFailed {
        call: RemoteCall,
        message: String,
        details: Option<ErrorDetails>,
    },

    #[error("Operation {operation} finished with an error")]
    OperationError {
        operation: String,
        details: ErrorDetails,
    },

    #[error("Operation did not complete after {attempts} polling attempts")]
    Timeout {
        attempts: u32,
        details: Option<ErrorDetails>,
    },

    #[error("Failed to create revision payload: {0}")]
    PayloadCreationFailed(String),
}

pub type InvestigationResult<T> = Result<T, InvestigationError>;

impl InvestigationError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::MissingIdentifier(_) => ErrorKind::MissingIdentifier,
            Self::AuthFailed(_) => ErrorKind::AuthFailed,
            Self::ApiDiscoveryFailed(_) => ErrorKind::ApiDiscoveryFailed,
            Self::RemoteCallFailed { .. } => ErrorKind::RemoteCallFailed,
            Self::OperationError { .. } => ErrorKind::OperationError,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::PayloadCreationFailed(_) => ErrorKind::PayloadCreationFailed,
        }
    }

    pub fn details(&self) -> Option<&ErrorDetails> {
        match self {
            Self::RemoteCallFailed { details, .. } | Self::Timeout { details, .. } => {
                details.as_ref()
            }
            Self::OperationError { details, .. } => Some(details),
            _ => None,
        }
    }

    /// Wrap an unexpected failure from the transport layer.
    pub fn remote(call: RemoteCall, message: impl Into<String>) -> Self {
        Self::RemoteCallFailed {
            call,
            message: message.into(),
            details: None,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from(self)
    }
}

/// Structured, serializable form of an [`InvestigationError`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

impl From<&InvestigationError> for ErrorReport {
    fn from(err: &InvestigationError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            details: err.details().cloned(),
        }
    }
}

impl ErrorReport {
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({ "kind": self.kind.as_str(), "message": self.message })
        })
    }

    pub fn to_human(&self) -> String {
        let mut out = format!("Error [{}]: {}", self.kind, self.message);
        if let Some(details) = &self.details {
            let payload = match details {
                ErrorDetails::Backend(v) | ErrorDetails::Description(v) => v,
            };
            let pretty = serde_json::to_string_pretty(payload).unwrap_or_default();
            out.push_str("\nDetails:\n");
            out.push_str(&pretty);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_codes_are_stable() {
        assert_eq!(
            InvestigationError::InvalidArgument("x".into()).kind().as_str(),
            "INVALID_ARGUMENT"
        );
        assert_eq!(
            InvestigationError::Timeout {
                attempts: 3,
                details: None
            }
            .kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            InvestigationError::PayloadCreationFailed("x".into()).kind(),
            ErrorKind::PayloadCreationFailed
        );
    }

    #[test]
    fn test_missing_identifier_message_is_verbatim() {
        let err = InvestigationError::MissingIdentifier("Revision ID are not set".into());
        assert_eq!(err.to_string(), "Revision ID are not set");
    }

    #[test]
    fn test_report_keeps_backend_payload_verbatim() {
        let payload = json!({"error": {"code": 404, "status": "NOT_FOUND"}});
        let err = InvestigationError::RemoteCallFailed {
            call: RemoteCall::Get,
            message: "HTTP 404".into(),
            details: Some(ErrorDetails::Backend(payload.clone())),
        };

        let report = err.report();
        assert_eq!(report.kind, ErrorKind::RemoteCallFailed);
        assert_eq!(report.details, Some(ErrorDetails::Backend(payload.clone())));

        let json = report.to_json();
        assert_eq!(json["kind"], "REMOTE_CALL_FAILED");
        assert_eq!(json["details"]["source"], "backend");
        assert_eq!(json["details"]["payload"], payload);
    }

    #[test]
    fn test_report_without_details_omits_field() {
        let report = InvestigationError::AuthFailed("no token".into()).report();
        let json = report.to_json();
        assert!(json.get("details").is_none());
        assert_eq!(report.to_human(), "Error [AUTH_FAILED]: Authentication failed: no token");
    }

    #[test]
    fn test_operation_error_always_has_details() {
        let err = InvestigationError::OperationError {
            operation: "operations/op-1".into(),
            details: ErrorDetails::Backend(json!({"code": 13})),
        };
        assert!(err.details().is_some());
        assert!(err.report().to_human().contains("\"code\": 13"));
    }
}
