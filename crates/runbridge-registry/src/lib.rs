//! # runbridge registry
//!
//! Discovers remote apps at start-up, normalizes each into a tool definition
//! and registers a handler per tool. Each handler validates arguments, runs
//! the app through the execution engine and unifies the outputs.

mod app_tool;
mod registry;
mod validate;

pub use app_tool::AppTool;
pub use registry::{DiscoveryReport, RegistryBuilder, RenamedTool, SkippedTool, ToolRegistry};
pub use validate::validate_params;
