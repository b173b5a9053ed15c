//! MCP (Model Context Protocol) stdio server.
//!
//! Exposes create, fetch, run and add-observation as tools for agents that
//! speak MCP over stdin/stdout.

pub mod stdio_server;

pub use stdio_server::StdioServer;
