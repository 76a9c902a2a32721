use super::{InvocationContext, ToolDefinition, ToolOutput};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Tool trait - a registered, invocable remote app
#[async_trait]
pub trait Tool: Send + Sync {
    /// Normalized definition advertised to callers
    fn definition(&self) -> &ToolDefinition;

    /// Identifier the remote service knows this tool by
    fn remote_id(&self) -> &str;

    /// Returns the sanitized name of the tool
    fn name(&self) -> &str {
        &self.definition().name
    }

    /// Returns a description of what the tool does
    fn description(&self) -> &str {
        &self.definition().description
    }

    /// Runs the tool. Never fails: errors come back as an error output.
    async fn invoke(&self, ctx: InvocationContext, params: Map<String, Value>) -> ToolOutput;
}
