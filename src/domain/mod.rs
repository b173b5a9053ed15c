//! Domain layer for investigation sessions
//!
//! This module contains the data model, resource addressing, error taxonomy
//! and the ports the session engine consumes.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{
    ErrorDetails, ErrorKind, ErrorReport, InvestigationError, InvestigationResult, RemoteCall,
};
