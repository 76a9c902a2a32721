//! Run lifecycle types shared by the client and the execution engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifies one remote execution. Created on submission, dropped once the
/// run reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunHandle {
    #[serde(alias = "run_id", alias = "id")]
    pub run_id: String,

    #[serde(default, alias = "stream_url", skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
}

impl RunHandle {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            stream_url: None,
        }
    }

    pub fn with_stream_url(mut self, url: impl Into<String>) -> Self {
        self.stream_url = Some(url.into());
        self
    }
}

/// Remote run status. Unrecognized values are kept verbatim and treated as
/// non-terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    Other(String),
}

impl From<String> for RunStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "pending" | "queued" | "created" | "submitted" => RunStatus::Pending,
            "running" | "in_progress" | "processing" | "started" => RunStatus::Running,
            "completed" | "succeeded" | "success" | "done" => RunStatus::Completed,
            "failed" | "error" | "errored" => RunStatus::Failed,
            "cancelled" | "canceled" => RunStatus::Cancelled,
            _ => RunStatus::Other(value),
        }
    }
}

impl From<RunStatus> for String {
    fn from(value: RunStatus) -> Self {
        match value {
            RunStatus::Pending => "pending".to_string(),
            RunStatus::Running => "running".to_string(),
            RunStatus::Completed => "completed".to_string(),
            RunStatus::Failed => "failed".to_string(),
            RunStatus::Cancelled => "cancelled".to_string(),
            RunStatus::Other(other) => other,
        }
    }
}

/// Body of the status resource, and of terminal records inside a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatusReport {
    pub status: RunStatus,

    #[serde(default, alias = "output", skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl RunStatusReport {
    pub fn new(status: RunStatus) -> Self {
        Self {
            status,
            outputs: None,
            error: None,
        }
    }

    /// Outputs, ignoring an explicit JSON `null`
    pub fn outputs(&self) -> Option<&Value> {
        self.outputs.as_ref().filter(|v| !v.is_null())
    }

    /// Human-readable failure reason, with a generic fallback
    pub fn failure_reason(&self) -> String {
        match &self.error {
            Some(Value::String(message)) if !message.is_empty() => message.clone(),
            Some(Value::Object(map)) => map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| Value::Object(map.clone()).to_string()),
            Some(other) if !other.is_null() => other.to_string(),
            _ => match self.status {
                RunStatus::Cancelled => "Run was cancelled by the remote service".to_string(),
                _ => "Run failed without an error message".to_string(),
            },
        }
    }
}

/// Lifecycle phase a failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    Validation,
    Submit,
    Run,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunPhase::Validation => write!(f, "validation"),
            RunPhase::Submit => write!(f, "submission"),
            RunPhase::Run => write!(f, "execution"),
        }
    }
}

/// Terminal result of one invocation. Produced exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Succeeded(Value),
    Failed { phase: RunPhase, reason: String },
    TimedOut,
    Cancelled,
}

impl RunOutcome {
    pub fn failed(phase: RunPhase, reason: impl Into<String>) -> Self {
        RunOutcome::Failed {
            phase,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RunOutcome::Succeeded(_) => "succeeded",
            RunOutcome::Failed { .. } => "failed",
            RunOutcome::TimedOut => "timed_out",
            RunOutcome::Cancelled => "cancelled",
        }
    }

}
