//! MCP stdio server command.

use anyhow::Result;

use crate::adapters::mcp::StdioServer;
use crate::domain::ports::InvestigationBackend;
use crate::services::InvestigationClient;

/// Serve the investigation tools until stdin closes.
pub async fn execute<B: InvestigationBackend>(client: InvestigationClient<B>) -> Result<()> {
    StdioServer::new(client).run().await
}
