//! # runbridge client
//!
//! Outbound calls to the remote execution service: tool listing, run
//! submission, status reads and event streams.

mod auth;
mod client;
mod retry;
mod service;
mod stream;
mod types;

pub use auth::AuthConfig;
pub use client::RunClient;
pub use retry::RetryPolicy;
pub use service::{AppService, RecordStream};
pub use stream::{StreamRecord, classify_record};
pub use types::{ListResponse, SubmitRunRequest, ToolPage};
