//! # runbridge engine
//!
//! Drives one invocation from submission to a terminal [`RunOutcome`], by
//! streaming or polling, under an attempt cap, an optional deadline and a
//! caller-supplied cancellation token.
//!
//! [`RunOutcome`]: runbridge_core::RunOutcome

mod engine;
mod policy;
mod tracker;

pub use engine::ExecutionEngine;
pub use policy::PollPolicy;
pub use tracker::{RunGuard, RunTracker};
