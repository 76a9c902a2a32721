//! Run lifecycle for a single invocation.
//!
//! ```text
//! Submitting ──► Streaming ──► (trailing poll) ──┐
//!      │              └─ terminal record ────────┤
//!      └───────► Polling ────────────────────────┴──► Succeeded | Failed | TimedOut
//! ```
//!
//! Cancellation and the optional wall-clock deadline wrap the whole
//! lifecycle and can end it at any suspension point.

use crate::policy::PollPolicy;
use futures::StreamExt;
use runbridge_client::{AppService, StreamRecord, classify_record};
use runbridge_core::{
    BridgeConfig, Error, InvocationContext, PartialOutputSink, RunOutcome, RunPhase, RunStatus,
    RunStatusReport,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, Span, debug, info, info_span, trace, warn};

/// Drives submit, stream-or-poll and resolution for one invocation at a
/// time. Holds no per-run state, so one engine serves concurrent calls.
#[derive(Clone)]
pub struct ExecutionEngine {
    service: Arc<dyn AppService>,
    policy: PollPolicy,
    deadline: Option<Duration>,
}

impl ExecutionEngine {
    pub fn new(service: Arc<dyn AppService>) -> Self {
        Self {
            service,
            policy: PollPolicy::default(),
            deadline: None,
        }
    }

    pub fn from_config(service: Arc<dyn AppService>, config: &BridgeConfig) -> Self {
        Self::new(service)
            .with_policy(PollPolicy::from_config(&config.polling))
            .with_deadline(config.polling.deadline())
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Wall-clock ceiling for the whole lifecycle, on top of the attempt cap
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    pub fn service(&self) -> &Arc<dyn AppService> {
        &self.service
    }

    /// Run `tool_id` with `inputs` to a terminal outcome. Never fails: every
    /// error becomes a [`RunOutcome`].
    pub async fn execute(
        &self,
        tool_id: &str,
        inputs: &Map<String, Value>,
        ctx: &InvocationContext,
    ) -> RunOutcome {
        let span = info_span!(
            "run",
            tool_id = %tool_id,
            invocation_id = %ctx.invocation_id(),
            run_id = tracing::field::Empty,
        );
        let cancel = ctx.cancellation().clone();

        let bounded = async {
            let lifecycle = self.lifecycle(tool_id, inputs, ctx);
            match self.deadline {
                Some(deadline) => match tokio::time::timeout(deadline, lifecycle).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(deadline_ms = deadline.as_millis() as u64, "Run deadline elapsed");
                        RunOutcome::TimedOut
                    }
                },
                None => lifecycle.await,
            }
        };

        let outcome = async {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Run cancelled by caller");
                    RunOutcome::Cancelled
                }
                outcome = bounded => outcome,
            }
        }
        .instrument(span.clone())
        .await;

        span.in_scope(|| debug!(outcome = outcome.kind(), "Run resolved"));
        outcome
    }

    async fn lifecycle(
        &self,
        tool_id: &str,
        inputs: &Map<String, Value>,
        ctx: &InvocationContext,
    ) -> RunOutcome {
        let handle = match self.service.submit_run(tool_id, inputs).await {
            Ok(handle) => {
                Span::current().record("run_id", handle.run_id.as_str());
                handle
            }
            Err(e) => {
                warn!(error = %e, "Run submission failed");
                return RunOutcome::failed(RunPhase::Submit, submission_reason(e));
            }
        };

        match handle.stream_url.as_deref() {
            Some(stream_url) => {
                self.stream(&handle.run_id, stream_url, ctx.sink())
                    .await
            }
            None => self.poll(&handle.run_id, None).await,
        }
    }

    /// Consume the event stream, then resolve the run. Stream closure is not
    /// itself terminal.
    async fn stream(
        &self,
        run_id: &str,
        stream_url: &str,
        sink: Option<Arc<dyn PartialOutputSink>>,
    ) -> RunOutcome {
        let mut records = match self.service.open_stream(stream_url).await {
            Ok(records) => records,
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "Could not open run stream, polling instead");
                return self.poll(run_id, None).await;
            }
        };
        debug!(run_id = %run_id, "Streaming run output");

        let mut partials = Vec::new();
        while let Some(line) = records.next().await {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(run_id = %run_id, error = %e, "Run stream broke off");
                    break;
                }
            };

            match classify_record(&line) {
                StreamRecord::Blank => {}
                StreamRecord::Diagnostic(text) => trace!(run_id = %run_id, record = %text, "Remote log line"),
                StreamRecord::Unrecognized(text) => {
                    debug!(run_id = %run_id, record = %text, "Ignoring unrecognized stream record")
                }
                StreamRecord::Payload(payload) => match status_record(&payload) {
                    Some(report) => {
                        if let Some(outcome) = resolve_status(&report, None) {
                            debug!(run_id = %run_id, "Run resolved by stream record");
                            return outcome;
                        }
                    }
                    None => {
                        if let Some(sink) = &sink {
                            sink.send(payload.clone());
                        }
                        partials.push(payload);
                    }
                },
            }
        }

        debug!(run_id = %run_id, partials = partials.len(), "Run stream closed");
        self.poll(run_id, collapse_partials(partials)).await
    }

    /// Fixed-interval status reads. `fallback` stands in for the outputs of
    /// a run that reports completion without any.
    async fn poll(&self, run_id: &str, fallback: Option<Value>) -> RunOutcome {
        for attempt in 1..=self.policy.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.policy.interval).await;
            }

            match self.service.run_status(run_id).await {
                Ok(report) => {
                    if let Some(outcome) = resolve_status(&report, fallback.as_ref()) {
                        debug!(run_id = %run_id, attempt, "Run reached a terminal status");
                        return outcome;
                    }
                    trace!(run_id = %run_id, attempt, status = ?report.status, "Run still in progress");
                }
                Err(e) => {
                    debug!(run_id = %run_id, attempt, error = %e, "Status read failed, counting attempt");
                }
            }
        }

        warn!(
            run_id = %run_id,
            attempts = self.policy.max_attempts,
            "Run did not finish within the poll budget"
        );
        RunOutcome::TimedOut
    }
}

/// Terminal outcome for a status report, if it has one
fn resolve_status(report: &RunStatusReport, fallback: Option<&Value>) -> Option<RunOutcome> {
    match report.status {
        RunStatus::Completed => report
            .outputs()
            .or(fallback)
            .cloned()
            .map(RunOutcome::Succeeded),
        RunStatus::Failed | RunStatus::Cancelled => {
            Some(RunOutcome::failed(RunPhase::Run, report.failure_reason()))
        }
        _ => None,
    }
}

/// Stream payloads whose `status` is a known run status are lifecycle
/// records. Anything else, `{"status": "ok", ...}` included, is app output.
fn status_record(payload: &Value) -> Option<RunStatusReport> {
    let status = RunStatus::from(payload.get("status")?.as_str()?.to_string());
    if matches!(status, RunStatus::Other(_)) {
        return None;
    }
    serde_json::from_value(payload.clone()).ok()
}

fn collapse_partials(mut partials: Vec<Value>) -> Option<Value> {
    match partials.len() {
        0 => None,
        1 => partials.pop(),
        _ => Some(Value::Array(partials)),
    }
}

fn submission_reason(error: Error) -> String {
    match error {
        Error::Submission { status, body } if !body.trim().is_empty() => match status {
            Some(status) => format!("HTTP {}: {}", status, body),
            None => body,
        },
        other => other.to_string(),
    }
}
