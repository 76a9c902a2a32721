//! Common test utilities and helpers

#![allow(dead_code)]

use runbridge_client::RunClient;
use runbridge_core::{BridgeConfig, InvocationContext, ToolOutput};
use runbridge_engine::ExecutionEngine;
use runbridge_registry::{DiscoveryReport, RegistryBuilder, ToolRegistry};
use serde_json::{Value, json};
use std::sync::Arc;

/// Configuration pointing at a mock server, with near-zero poll and retry
/// intervals.
pub fn bridge_config(server_url: &str) -> BridgeConfig {
    BridgeConfig::test_defaults(server_url)
}

/// Discover the mock server's tools the same way the binary does.
pub async fn discover(config: &BridgeConfig) -> anyhow::Result<(ToolRegistry, DiscoveryReport)> {
    let client = RunClient::from_config(config)?;
    let engine = ExecutionEngine::from_config(Arc::new(client), config);
    let registry = RegistryBuilder::from_config(engine, config)
        .discover()
        .await?;
    Ok(registry)
}

/// Invoke `tool` with fresh context
pub async fn call(registry: &ToolRegistry, tool: &str, args: Value) -> ToolOutput {
    registry
        .invoke(tool, args, InvocationContext::new())
        .await
}

/// Listing body holding one sentinel-only tool
pub fn web_search_listing() -> String {
    json!([
        {
            "id": "app-web-search",
            "name": "Web Search!",
            "description": "Search the web",
            "inputSchema": {
                "type": "object",
                "properties": {"random_string": {"type": "string"}},
                "required": ["random_string"]
            }
        }
    ])
    .to_string()
}

/// First text body of an output
pub fn first_text(output: &ToolOutput) -> &str {
    output
        .content
        .first()
        .map(|block| block.body())
        .unwrap_or_default()
}
