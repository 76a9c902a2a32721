use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Receives partial payloads while a run is streaming
pub trait PartialOutputSink: Send + Sync {
    fn send(&self, partial: Value);
}

impl PartialOutputSink for UnboundedSender<Value> {
    fn send(&self, partial: Value) {
        // A closed receiver means nobody is listening any more.
        let _ = UnboundedSender::send(self, partial);
    }
}

/// Per-call context handed to a tool handler.
///
/// Each invocation owns its own context; nothing here is shared between
/// concurrent calls except what the caller chooses to clone in.
#[derive(Clone)]
pub struct InvocationContext {
    invocation_id: String,
    cancel: CancellationToken,
    sink: Option<Arc<dyn PartialOutputSink>>,
}

impl InvocationContext {
    pub fn new() -> Self {
        Self {
            invocation_id: Uuid::new_v4().to_string(),
            cancel: CancellationToken::new(),
            sink: None,
        }
    }

    pub fn with_invocation_id(mut self, id: impl Into<String>) -> Self {
        self.invocation_id = id.into();
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn PartialOutputSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn sink(&self) -> Option<Arc<dyn PartialOutputSink>> {
        self.sink.clone()
    }
}

impl Default for InvocationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationContext")
            .field("invocation_id", &self.invocation_id)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}
