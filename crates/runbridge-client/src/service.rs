use async_trait::async_trait;
use futures::stream::BoxStream;
use runbridge_core::{Result, RunHandle, RunStatusReport};
use serde_json::{Map, Value};

/// Lines of a run's event stream, in arrival order
pub type RecordStream = BoxStream<'static, Result<String>>;

/// Operations the bridge needs from the remote execution service.
///
/// [`crate::RunClient`] talks HTTP; tests swap in scripted implementations.
#[async_trait]
pub trait AppService: Send + Sync {
    /// Every descriptor record, across all pages, unparsed
    async fn list_tools(&self) -> Result<Vec<Value>>;

    /// Full descriptor for one tool, used when the listing omits the schema
    async fn describe_tool(&self, tool_id: &str) -> Result<Value>;

    /// Create a run. Never retried.
    async fn submit_run(&self, tool_id: &str, inputs: &Map<String, Value>) -> Result<RunHandle>;

    async fn run_status(&self, run_id: &str) -> Result<RunStatusReport>;

    /// Open the newline-delimited event stream at `stream_url`
    async fn open_stream(&self, stream_url: &str) -> Result<RecordStream>;
}
