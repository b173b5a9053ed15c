//! Adapters exposing the investigation session engine to agents.

pub mod mcp;
