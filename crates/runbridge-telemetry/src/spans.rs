//! Span helpers for tool calls and discovery

use crate::attributes::*;

/// Attributes for tracing a tool call
#[derive(Debug, Clone)]
pub struct ToolSpanAttributes {
    pub tool_name: String,
    pub tool_description: String,
    pub remote_tool_id: String,
    pub invocation_id: String,
    pub args_json: String,
    pub response_json: String,
    /// `succeeded`, `failed`, `timed_out`, `cancelled` or `rejected`
    pub outcome: String,
    pub duration_ms: u64,
}

/// Record a span for one tool invocation.
///
/// Carries the tool identity, arguments, response and run outcome so a call
/// can be followed from the protocol request to the remote run.
pub fn trace_tool_call(attrs: ToolSpanAttributes) {
    let span = tracing::info_span!(
        "execute_tool",
        { GEN_AI_OPERATION_NAME } = "execute_tool",
        { GEN_AI_TOOL_NAME } = %attrs.tool_name,
        { GEN_AI_TOOL_DESCRIPTION } = %attrs.tool_description,
        { RUNBRIDGE_REMOTE_TOOL_ID } = %attrs.remote_tool_id,
        { RUNBRIDGE_INVOCATION_ID } = %attrs.invocation_id,
        { RUNBRIDGE_TOOL_CALL_ARGS } = %attrs.args_json,
        { RUNBRIDGE_TOOL_RESPONSE } = %attrs.response_json,
        { RUNBRIDGE_RUN_OUTCOME } = %attrs.outcome,
        { RUNBRIDGE_DURATION_MS } = attrs.duration_ms,
    );

    let _guard = span.enter();
}

/// Record a span summarising start-up discovery
pub fn trace_discovery(listed: usize, registered: usize, skipped: usize) {
    let span = tracing::info_span!(
        "discover_tools",
        { GEN_AI_OPERATION_NAME } = "discover_tools",
        { RUNBRIDGE_TOOLS_LISTED } = listed,
        { RUNBRIDGE_TOOLS_REGISTERED } = registered,
        { RUNBRIDGE_TOOLS_SKIPPED } = skipped,
    );

    let _guard = span.enter();
}

/// Helper to safely serialize to JSON string
pub fn safe_serialize<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "<not serializable>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_serialize() {
        let value = serde_json::json!({"query": "rust"});
        let result = safe_serialize(&value);
        assert_eq!(result, r#"{"query":"rust"}"#);
    }

    #[test]
    fn test_tool_span_attributes() {
        let attrs = ToolSpanAttributes {
            tool_name: "Web_Search".to_string(),
            tool_description: "Search the web".to_string(),
            remote_tool_id: "app-1".to_string(),
            invocation_id: "inv-123".to_string(),
            args_json: r#"{"input": "rust"}"#.to_string(),
            response_json: r#"{"content": []}"#.to_string(),
            outcome: "succeeded".to_string(),
            duration_ms: 12,
        };

        trace_tool_call(attrs);
        trace_discovery(3, 2, 1);
    }
}
