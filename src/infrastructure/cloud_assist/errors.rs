use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::domain::errors::{ErrorDetails, InvestigationError, RemoteCall};

/// Errors that can occur when talking to the Cloud Assist API
#[derive(Error, Debug)]
pub enum TransportError {
    /// Invalid request parameters (HTTP 400)
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String, body: Option<Value> },

    /// Missing or expired credentials (HTTP 401)
    #[error("Unauthenticated: {message}")]
    Unauthenticated { message: String, body: Option<Value> },

    /// Permission denied (HTTP 403)
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String, body: Option<Value> },

    /// Resource not found (HTTP 404)
    #[error("Not found: {message}")]
    NotFound { message: String, body: Option<Value> },

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded { message: String, body: Option<Value> },

    /// Server error (HTTP 5xx)
    #[error("Server error ({status}): {message}")]
    ServerError {
        status: StatusCode,
        message: String,
        body: Option<Value>,
    },

    /// Any other non-success status
    #[error("Unexpected status ({status}): {message}")]
    UnexpectedStatus {
        status: StatusCode,
        message: String,
        body: Option<Value>,
    },

    /// Network or connection error
    #[error("Network error: {0}")]
    NetworkError(reqwest::Error),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Response body did not match the expected schema
    #[error("Failed to decode response: {0}")]
    DecodeError(#[from] serde_json::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::NetworkError(err)
        }
    }
}

impl TransportError {
    /// Classify a non-success response.
    ///
    /// Google APIs return `{"error": {"code", "message", "status"}}`; the
    /// message is lifted out of it and the whole body is kept verbatim.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let json: Option<Value> = serde_json::from_str(body).ok();
        let message = json
            .as_ref()
            .and_then(|v| v["error"]["message"].as_str())
            .map_or_else(
                || {
                    let text = body.trim();
                    if text.is_empty() {
                        status.to_string()
                    } else {
                        text.to_string()
                    }
                },
                str::to_string,
            );
        let body = json;

        match status.as_u16() {
            400 => Self::InvalidRequest { message, body },
            401 => Self::Unauthenticated { message, body },
            403 => Self::PermissionDenied { message, body },
            404 => Self::NotFound { message, body },
            429 => Self::RateLimitExceeded { message, body },
            500..=599 => Self::ServerError {
                status,
                message,
                body,
            },
            _ => Self::UnexpectedStatus {
                status,
                message,
                body,
            },
        }
    }

    /// Returns true if this error is transient and should be retried
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded { .. }
                | Self::ServerError { .. }
                | Self::Timeout
                | Self::NetworkError(_)
        )
    }

    /// Backend error body, if the server sent JSON.
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::InvalidRequest { body, .. }
            | Self::Unauthenticated { body, .. }
            | Self::PermissionDenied { body, .. }
            | Self::NotFound { body, .. }
            | Self::RateLimitExceeded { body, .. }
            | Self::ServerError { body, .. }
            | Self::UnexpectedStatus { body, .. } => body.as_ref(),
            Self::NetworkError(_) | Self::Timeout | Self::DecodeError(_) => None,
        }
    }

    /// Convert into the domain error for the given call.
    pub fn into_investigation_error(self, call: RemoteCall) -> InvestigationError {
        let details = self.body().cloned().map(ErrorDetails::Backend);
        InvestigationError::RemoteCallFailed {
            call,
            message: self.to_string(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const GOOGLE_ERROR: &str =
        r#"{"error":{"code":403,"message":"Permission denied on project","status":"PERMISSION_DENIED"}}"#;

    #[test]
    fn test_from_status_lifts_google_error_message() {
        let err = TransportError::from_status(StatusCode::FORBIDDEN, GOOGLE_ERROR);
        assert!(matches!(err, TransportError::PermissionDenied { .. }));
        assert_eq!(err.to_string(), "Permission denied: Permission denied on project");
        assert_eq!(err.body().unwrap()["error"]["status"], "PERMISSION_DENIED");
    }

    #[test]
    fn test_from_status_with_plain_text_body() {
        let err = TransportError::from_status(StatusCode::BAD_GATEWAY, "upstream hiccup");
        assert!(matches!(err, TransportError::ServerError { .. }));
        assert!(err.to_string().contains("upstream hiccup"));
        assert!(err.body().is_none());
    }

    #[test]
    fn test_transient_errors() {
        assert!(TransportError::from_status(StatusCode::TOO_MANY_REQUESTS, "").is_transient());
        assert!(TransportError::from_status(StatusCode::SERVICE_UNAVAILABLE, "").is_transient());
        assert!(TransportError::Timeout.is_transient());
    }

    #[test]
    fn test_permanent_errors() {
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::UNAUTHORIZED,
            StatusCode::FORBIDDEN,
            StatusCode::NOT_FOUND,
            StatusCode::CONFLICT,
        ] {
            assert!(!TransportError::from_status(status, "").is_transient(), "{status}");
        }
    }

    #[test]
    fn test_into_investigation_error_keeps_body_verbatim() {
        let err = TransportError::from_status(StatusCode::FORBIDDEN, GOOGLE_ERROR)
            .into_investigation_error(RemoteCall::Get);

        let InvestigationError::RemoteCallFailed { call, details, .. } = err else {
            panic!("expected RemoteCallFailed");
        };
        assert_eq!(call, RemoteCall::Get);
        assert_eq!(
            details,
            Some(ErrorDetails::Backend(json!({
                "error": {"code": 403, "message": "Permission denied on project", "status": "PERMISSION_DENIED"}
            })))
        );
    }
}
