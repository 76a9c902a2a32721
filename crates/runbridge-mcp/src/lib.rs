//! # runbridge MCP server
//!
//! Serves the discovered tool registry to MCP clients over stdio.

mod server;

pub use server::{BridgeServer, to_call_result, to_mcp_tool};
