//! A remote app registered as a tool.

use crate::validate::validate_params;
use async_trait::async_trait;
use runbridge_core::{
    Error, InvocationContext, RunOutcome, RunPhase, Tool, ToolDefinition, ToolOutput,
};
use runbridge_engine::ExecutionEngine;
use runbridge_telemetry::{ToolSpanAttributes, safe_serialize, trace_tool_call};
use runbridge_unify::ResponseUnifier;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Handler for one discovered app: validate, run, unify.
pub struct AppTool {
    definition: ToolDefinition,
    remote_id: String,
    engine: ExecutionEngine,
    unifier: Arc<ResponseUnifier>,
}

impl AppTool {
    pub fn new(
        definition: ToolDefinition,
        remote_id: impl Into<String>,
        engine: ExecutionEngine,
        unifier: Arc<ResponseUnifier>,
    ) -> Self {
        Self {
            definition,
            remote_id: remote_id.into(),
            engine,
            unifier,
        }
    }

    /// Turn a run outcome into caller-facing output. Failures name the tool
    /// and the phase that failed.
    fn render(&self, outcome: RunOutcome) -> ToolOutput {
        let name = &self.definition.name;
        match outcome {
            RunOutcome::Succeeded(outputs) => ToolOutput::success(self.unifier.unify(&outputs)),
            RunOutcome::Failed { phase, reason } => ToolOutput::error(format!(
                "Tool '{}' failed during {}: {}",
                name, phase, reason
            )),
            RunOutcome::TimedOut => ToolOutput::error(format!(
                "Tool '{}' timed out waiting for the run to finish",
                name
            )),
            RunOutcome::Cancelled => {
                ToolOutput::error(format!("Tool '{}' was cancelled before the run finished", name))
            }
        }
    }
}

#[async_trait]
impl Tool for AppTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    fn remote_id(&self) -> &str {
        &self.remote_id
    }

    async fn invoke(&self, ctx: InvocationContext, params: Map<String, Value>) -> ToolOutput {
        let started = Instant::now();
        let args_json = safe_serialize(&params);

        debug!(
            invocation_id = %ctx.invocation_id(),
            tool = %self.definition.name,
            remote_id = %self.remote_id,
            "Invoking remote app"
        );

        let (output, outcome_kind) =
            match validate_params(&self.definition.input_schema, params) {
                Ok(inputs) => {
                    let outcome = self.engine.execute(&self.remote_id, &inputs, &ctx).await;
                    let kind = outcome.kind();
                    (self.render(outcome), kind)
                }
                Err(e) => {
                    let reason = match e {
                        Error::InvalidInput(reason) => reason,
                        other => other.to_string(),
                    };
                    warn!(tool = %self.definition.name, reason = %reason, "Rejected tool arguments");
                    let failed = RunOutcome::failed(RunPhase::Validation, reason);
                    (self.render(failed), "rejected")
                }
            };

        trace_tool_call(ToolSpanAttributes {
            tool_name: self.definition.name.clone(),
            tool_description: self.definition.description.clone(),
            remote_tool_id: self.remote_id.clone(),
            invocation_id: ctx.invocation_id().to_string(),
            args_json,
            response_json: safe_serialize(&output),
            outcome: outcome_kind.to_string(),
            duration_ms: started.elapsed().as_millis() as u64,
        });

        output
    }
}
