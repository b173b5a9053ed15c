//! MCP stdio server implementing JSON-RPC 2.0 over stdin/stdout.
//!
//! Exposes the investigation operations as tools via the Model Context
//! Protocol.
//!
//! Protocol: newline-delimited JSON-RPC 2.0 on stdin/stdout.
//! Logging goes to stderr (stdout is reserved for protocol messages).

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::domain::errors::{InvestigationError, InvestigationResult};
use crate::domain::ports::InvestigationBackend;
use crate::services::{
    AddObservationRequest, CreateRequest, FetchRequest, InvestigationClient, RunRequest,
};

const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;

/// MCP stdio server exposing investigation tools.
pub struct StdioServer<B: InvestigationBackend> {
    client: InvestigationClient<B>,
}

impl<B: InvestigationBackend> StdioServer<B> {
    pub const fn new(client: InvestigationClient<B>) -> Self {
        Self { client }
    }

    /// Run the server on the process stdin/stdout until stdin closes.
    pub async fn run(&self) -> anyhow::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve newline-delimited requests from `reader`, writing responses to
    /// `writer`.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        info!("MCP stdio server started");

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(line).await {
                let mut bytes = response.into_bytes();
                bytes.push(b'\n');
                writer.write_all(&bytes).await?;
                writer.flush().await?;
            }
        }

        info!("MCP stdio server stopped");
        Ok(())
    }

    /// Handle one JSON-RPC message. Notifications produce no response.
    pub async fn handle_message(&self, line: &str) -> Option<String> {
        let request: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                return Some(error_response(
                    Value::Null,
                    PARSE_ERROR,
                    &format!("Parse error: {e}"),
                ));
            }
        };

        let Some(method) = request.get("method").and_then(Value::as_str) else {
            return Some(error_response(
                request.get("id").cloned().unwrap_or(Value::Null),
                INVALID_REQUEST,
                "Invalid request: missing method",
            ));
        };
        let Some(id) = request.get("id").cloned() else {
            debug!(method, "received notification");
            return None;
        };
        let params = request.get("params").cloned().unwrap_or_else(|| json!({}));

        let response = match method {
            "initialize" => success_response(id, initialize_result()),
            "ping" => success_response(id, json!({})),
            "tools/list" => success_response(id, json!({ "tools": tool_definitions() })),
            "tools/call" => self.handle_tools_call(id, &params).await,
            _ => error_response(id, METHOD_NOT_FOUND, &format!("Method not found: {method}")),
        };
        Some(response)
    }

    async fn handle_tools_call(&self, id: Value, params: &Value) -> String {
        let tool_name = params.get("name").and_then(Value::as_str).unwrap_or("");
        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| json!({}));

        debug!(tool = tool_name, "tool call");
        let result = match tool_name {
            "create_investigation" => self.tool_create(arguments).await,
            "fetch_investigation" => self.tool_fetch(arguments).await,
            "run_investigation" => self.tool_run(arguments).await,
            "add_observation" => self.tool_add_observation(arguments).await,
            _ => Err(InvestigationError::InvalidArgument(format!(
                "Unknown tool: {tool_name}"
            ))),
        };

        let result = match result {
            Ok(text) => json!({
                "content": [{ "type": "text", "text": text }]
            }),
            Err(error) => {
                warn!(tool = tool_name, kind = %error.kind(), error = %error, "tool call failed");
                json!({
                    "content": [{ "type": "text", "text": error.report().to_json().to_string() }],
                    "isError": true
                })
            }
        };
        success_response(id, result)
    }

    async fn tool_create(&self, args: Value) -> InvestigationResult<String> {
        let request: CreateRequest = parse_arguments(args)?;
        Ok(self.client.create(request).await?.markdown)
    }

    async fn tool_fetch(&self, args: Value) -> InvestigationResult<String> {
        let request: FetchRequest = parse_arguments(args)?;
        self.client.fetch(request).await
    }

    async fn tool_run(&self, args: Value) -> InvestigationResult<String> {
        let request: RunRequest = parse_arguments(args)?;
        Ok(self.client.run(request).await?.markdown)
    }

    async fn tool_add_observation(&self, args: Value) -> InvestigationResult<String> {
        let request: AddObservationRequest = parse_arguments(args)?;
        Ok(self.client.add_observation(request).await?.markdown)
    }
}

fn parse_arguments<T: DeserializeOwned>(args: Value) -> InvestigationResult<T> {
    serde_json::from_value(args)
        .map_err(|e| InvestigationError::InvalidArgument(format!("invalid tool arguments: {e}")))
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {} },
        "serverInfo": {
            "name": "troubleshooter",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

fn tool_definitions() -> Value {
    json!([
        {
            "name": "create_investigation",
            "description": "Open a new troubleshooting investigation for an issue in a Google Cloud project. Returns a report whose **Investigation Path** and **Revision Path** lines end with the ids needed by run_investigation and add_observation.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "title": { "type": "string", "description": "Short title of the issue" },
                    "project_id": { "type": "string", "description": "Google Cloud project id" },
                    "description": { "type": "string", "description": "Detailed description of the issue, symptoms and error messages" },
                    "relevant_resources": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Full resource names starting with '//', e.g. //container.googleapis.com/projects/p/locations/l/clusters/c"
                    },
                    "start_time": { "type": "string", "description": "RFC 3339 time the issue started, e.g. 2025-01-01T00:00:00Z" }
                },
                "required": ["title", "project_id", "description"]
            }
        },
        {
            "name": "fetch_investigation",
            "description": "Fetch one investigation (optionally a specific revision) as a full report, or list investigations in a project when no investigation_id is given.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "project_id": { "type": "string", "description": "Google Cloud project id" },
                    "investigation_id": { "type": "string", "description": "Investigation id; omit to list investigations" },
                    "revision_id": { "type": "string", "description": "Revision id; requires investigation_id" },
                    "title": { "type": "string", "description": "Only list investigations with this title" },
                    "page_size": { "type": "integer", "description": "Maximum number of investigations to list" },
                    "page_token": { "type": "string", "description": "Token from a previous list call; not allowed with investigation_id" }
                },
                "required": ["project_id"]
            }
        },
        {
            "name": "run_investigation",
            "description": "Run the analysis of an investigation revision and wait for it to finish. Returns the full report with observations and hypotheses.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "project_id": { "type": "string", "description": "Google Cloud project id" },
                    "investigation_id": { "type": "string", "description": "Last segment of the **Investigation Path**" },
                    "revision_id": { "type": "string", "description": "Last segment of the **Revision Path**" }
                },
                "required": ["project_id", "investigation_id", "revision_id"]
            }
        },
        {
            "name": "add_observation",
            "description": "Add an observation to the latest revision of an investigation, creating a new revision. Run the new revision afterwards to refresh the analysis.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "project_id": { "type": "string", "description": "Google Cloud project id" },
                    "investigation_id": { "type": "string", "description": "Investigation id" },
                    "observation": { "type": "string", "description": "New information about the issue" },
                    "relevant_resources": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Additional full resource names starting with '//'"
                    }
                },
                "required": ["project_id", "investigation_id", "observation"]
            }
        }
    ])
}

fn success_response(id: Value, result: Value) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
    .to_string()
}

fn error_response(id: Value, code: i32, message: &str) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
    .to_string()
}
