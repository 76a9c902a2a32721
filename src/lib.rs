//! # runbridge
//!
//! Exposes remotely hosted apps as locally invocable MCP tools.
//!
//! At start-up the bridge lists the remote service's apps, normalizes each
//! descriptor into a strict tool definition and registers a handler per
//! tool. A tool call submits a run, follows it by streaming or polling until
//! it reaches a terminal state, and unifies the run's outputs into content
//! blocks.
//!
//! ## Crates
//!
//! - [`core`]: shared data model, configuration and errors
//! - [`schema`]: descriptor normalization and registration serialization
//! - [`client`]: HTTP client for the remote service
//! - [`engine`]: run lifecycle state machine
//! - [`unify`]: output shape unification
//! - [`registry`]: discovery and the tool registry
//! - [`telemetry`]: logging and tracing setup
//! - [`mcp`]: the MCP server

pub use runbridge_client as client;
pub use runbridge_core as core;
pub use runbridge_engine as engine;
pub use runbridge_mcp as mcp;
pub use runbridge_registry as registry;
pub use runbridge_schema as schema;
pub use runbridge_telemetry as telemetry;
pub use runbridge_unify as unify;

pub mod prelude {
    pub use runbridge_client::{AppService, AuthConfig, RetryPolicy, RunClient};
    pub use runbridge_core::{
        BridgeConfig, ContentBlock, Error, InvocationContext, Result, RunOutcome, Tool,
        ToolDefinition, ToolDescriptor, ToolOutput,
    };
    pub use runbridge_engine::{ExecutionEngine, PollPolicy, RunTracker};
    pub use runbridge_registry::{DiscoveryReport, RegistryBuilder, ToolRegistry};
    pub use runbridge_schema::SchemaNormalizer;
    pub use runbridge_unify::{ResponseUnifier, unify};
}
