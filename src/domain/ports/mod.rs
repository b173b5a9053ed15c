//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the async trait interfaces the session engine consumes:
//! - InvestigationBackend: remote investigation API calls
//! - CredentialProvider: opaque access tokens for the backend
//! - Sleeper: suspension between polling attempts
//!
//! These traits keep the core independent of the HTTP transport and of wall
//! clock time.

pub mod credentials;
pub mod investigation_backend;
pub mod sleeper;

pub use credentials::CredentialProvider;
pub use investigation_backend::{InvestigationBackend, ListRequest};
pub use sleeper::{Sleeper, TokioSleeper};
