//! # runbridge telemetry
//!
//! Structured logging and OpenTelemetry tracing for the bridge. Logs go to
//! stderr in pretty or JSON form; spans for tool calls and discovery carry
//! the attributes below.

mod spans;
mod tracer;

pub use spans::{ToolSpanAttributes, safe_serialize, trace_discovery, trace_tool_call};
pub use tracer::{TelemetryOptions, init_telemetry, register_span_processor, tracer_provider};

/// Span attribute names.
///
/// Generic tool attributes follow the OpenTelemetry generative-AI
/// conventions; bridge-specific ones live under `runbridge.`.
pub mod attributes {
    pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";
    pub const GEN_AI_TOOL_NAME: &str = "gen_ai.tool.name";
    pub const GEN_AI_TOOL_DESCRIPTION: &str = "gen_ai.tool.description";

    pub const RUNBRIDGE_REMOTE_TOOL_ID: &str = "runbridge.remote_tool_id";
    pub const RUNBRIDGE_INVOCATION_ID: &str = "runbridge.invocation_id";
    pub const RUNBRIDGE_TOOL_CALL_ARGS: &str = "runbridge.tool_call_args";
    pub const RUNBRIDGE_TOOL_RESPONSE: &str = "runbridge.tool_response";
    pub const RUNBRIDGE_RUN_OUTCOME: &str = "runbridge.run_outcome";
    pub const RUNBRIDGE_DURATION_MS: &str = "runbridge.duration_ms";

    pub const RUNBRIDGE_TOOLS_LISTED: &str = "runbridge.tools.listed";
    pub const RUNBRIDGE_TOOLS_REGISTERED: &str = "runbridge.tools.registered";
    pub const RUNBRIDGE_TOOLS_SKIPPED: &str = "runbridge.tools.skipped";

    pub const SYSTEM_NAME: &str = "runbridge";
}
