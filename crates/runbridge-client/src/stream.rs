//! Record classification for run event streams.
//!
//! A stream is newline-delimited. Each line is either a diagnostic log line
//! emitted by the app runtime, or a JSON payload carrying partial output or
//! a terminal status.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// `[2024-05-01T10:00:00Z] [INFO] [worker-3] message`
static BRACKETED_LOG_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\[[^\]]*\]\s*\[(?i:trace|debug|info|warn|warning|error|fatal|critical)\]\s*\[[^\]]*\]",
    )
    .expect("bracketed log-line pattern is valid")
});

/// `INFO: message`, the older runtime format
static LEGACY_LOG_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:TRACE|DEBUG|INFO|WARN|WARNING|ERROR):").expect("legacy log-line pattern is valid")
});

#[derive(Debug, Clone, PartialEq)]
pub enum StreamRecord {
    Blank,
    /// Log output from the remote runtime, never part of the result
    Diagnostic(String),
    /// JSON object or array
    Payload(Value),
    Unrecognized(String),
}

/// Classify one line of a run stream
pub fn classify_record(line: &str) -> StreamRecord {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return StreamRecord::Blank;
    }

    if BRACKETED_LOG_LINE.is_match(trimmed) || LEGACY_LOG_LINE.is_match(trimmed) {
        return StreamRecord::Diagnostic(trimmed.to_string());
    }

    // Some runtimes frame records as server-sent events
    let body = trimmed
        .strip_prefix("data:")
        .map(str::trim_start)
        .unwrap_or(trimmed);

    match serde_json::from_str::<Value>(body) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => StreamRecord::Payload(value),
        _ => StreamRecord::Unrecognized(trimmed.to_string()),
    }
}
