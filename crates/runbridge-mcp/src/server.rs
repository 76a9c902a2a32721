//! MCP server exposing the tool registry.

use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, JsonObject, ListToolsResult,
    LoggingLevel, LoggingMessageNotificationParam, PaginatedRequestParam, ServerCapabilities,
    ServerInfo, Tool as McpTool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{ErrorData as McpError, ServerHandler};
use runbridge_core::config::ServerConfig;
use runbridge_core::{ContentBlock, InvocationContext, PartialOutputSink, ToolDefinition, ToolOutput};
use runbridge_engine::RunTracker;
use runbridge_registry::ToolRegistry;
use runbridge_schema::registration_schema;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const DEFAULT_INSTRUCTIONS: &str = "Each tool runs a remote app. Calls submit a run, wait for it to \
finish and return its output. Partial output is sent as log notifications while a run streams.";

/// Serves every registered tool over MCP.
///
/// Tool calls are tracked so in-flight runs can be cancelled on shutdown.
#[derive(Clone)]
pub struct BridgeServer {
    registry: ToolRegistry,
    tracker: RunTracker,
    tools: Arc<Vec<McpTool>>,
    name: String,
    instructions: String,
}

impl BridgeServer {
    pub fn new(registry: ToolRegistry, config: &ServerConfig) -> Self {
        let tools = registry.definitions().iter().map(to_mcp_tool).collect();
        Self {
            registry,
            tracker: RunTracker::new(),
            tools: Arc::new(tools),
            name: config.name.clone(),
            instructions: config
                .instructions
                .clone()
                .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string()),
        }
    }

    pub fn tracker(&self) -> &RunTracker {
        &self.tracker
    }

    pub fn tools(&self) -> &[McpTool] {
        &self.tools
    }

    /// Run one tool call to completion. Failures come back as an error
    /// result, never as a protocol error.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
        cancel: CancellationToken,
        sink: Option<Arc<dyn PartialOutputSink>>,
    ) -> CallToolResult {
        let guard = self.tracker.guard(cancel.clone());
        let mut ctx = InvocationContext::new()
            .with_invocation_id(guard.invocation_id())
            .with_cancellation(cancel);
        if let Some(sink) = sink {
            ctx = ctx.with_sink(sink);
        }

        let params = arguments.map(Value::Object).unwrap_or(Value::Null);
        let output = self.registry.invoke(name, params, ctx).await;
        debug!(
            tool = %name,
            invocation_id = %guard.invocation_id(),
            is_error = output.is_error,
            "Tool call finished"
        );
        to_call_result(output)
    }
}

impl ServerHandler for BridgeServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_logging()
                .build(),
            server_info: Implementation {
                name: self.name.clone(),
                title: None,
                version: env!("CARGO_PKG_VERSION").to_string(),
                website_url: None,
                icons: None,
            },
            instructions: Some(self.instructions.clone()),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tools.as_ref().clone()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let name = request.name.to_string();
        info!(tool = %name, "Tool call received");

        let (tx, mut rx) = mpsc::unbounded_channel::<Value>();
        let peer = context.peer.clone();
        let logger = format!("runbridge/{}", name);
        let forwarder = tokio::spawn(async move {
            while let Some(partial) = rx.recv().await {
                let notification = LoggingMessageNotificationParam {
                    level: LoggingLevel::Info,
                    logger: Some(logger.clone()),
                    data: partial,
                };
                if let Err(e) = peer.notify_logging_message(notification).await {
                    debug!(error = %e, "Could not forward partial output, dropping the rest");
                    break;
                }
            }
        });

        let result = self
            .call(
                &name,
                request.arguments,
                context.ct.clone(),
                Some(Arc::new(tx)),
            )
            .await;

        // The sender is gone once the call returns; flush what is queued.
        let _ = forwarder.await;
        Ok(result)
    }
}

/// MCP tool entry for a definition, using the registration serializer
pub fn to_mcp_tool(definition: &ToolDefinition) -> McpTool {
    McpTool::new(
        definition.name.clone(),
        definition.description.clone(),
        Arc::new(registration_schema(definition)),
    )
}

/// Html is delivered as text; MCP has no html content type
pub fn to_call_result(output: ToolOutput) -> CallToolResult {
    let content = output.content.into_iter().map(to_mcp_content).collect();

    if output.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

/// Extra block fields such as annotations ride along when rmcp accepts them
fn to_mcp_content(block: ContentBlock) -> Content {
    let (body, extra) = match block {
        ContentBlock::Text { text, extra } => (text, extra),
        ContentBlock::Html { html, extra } => (html, extra),
    };
    if extra.is_empty() {
        return Content::text(body);
    }

    let mut raw = extra;
    raw.insert("type".to_string(), Value::String("text".to_string()));
    raw.insert("text".to_string(), Value::String(body.clone()));
    serde_json::from_value(Value::Object(raw)).unwrap_or_else(|e| {
        debug!(error = %e, "Dropping content fields rmcp does not accept");
        Content::text(body)
    })
}
