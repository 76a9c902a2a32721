//! Core types for runbridge
//!
//! This crate holds the data model shared by every other crate: remote tool
//! descriptors and their normalized definitions, run lifecycle types,
//! content blocks, configuration and the error taxonomy.

pub mod config;
pub mod content;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod run;
pub mod traits;

// Re-exports
pub use config::{BridgeConfig, LogFormat, RequiredPolicy};
pub use content::{ContentBlock, NO_RESPONSE_MESSAGE, ToolOutput};
pub use context::{InvocationContext, PartialOutputSink};
pub use descriptor::{InputSchema, PrimitiveType, PropertySchema, ToolDefinition, ToolDescriptor};
pub use error::{Error, Result};
pub use run::{RunHandle, RunOutcome, RunPhase, RunStatus, RunStatusReport};
pub use traits::Tool;
