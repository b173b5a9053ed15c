//! Gemini Cloud Assist investigations API
//!
//! - `client`: reqwest backend with lazy discovery and retries
//! - `mock_backend`: in-memory backend for tests and offline use

pub mod client;
pub mod errors;
pub mod mock_backend;
pub mod retry;

pub use client::CloudAssistClient;
pub use errors::TransportError;
pub use mock_backend::{MockAnalysis, MockInvestigationBackend};
pub use retry::RetryPolicy;
