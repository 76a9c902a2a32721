//! # runbridge schema normalization
//!
//! Turns the remote service's raw, possibly malformed tool descriptors into
//! strictly valid tool definitions.
//!
//! ## Example
//!
//! ```
//! use runbridge_core::ToolDescriptor;
//! use runbridge_schema::normalize;
//! use serde_json::json;
//!
//! let descriptor = ToolDescriptor::new("Web Search!").with_input_schema(json!({
//!     "properties": {"random_string": {"type": "string"}}
//! }));
//!
//! let definition = normalize(&descriptor);
//! assert_eq!(definition.name, "Web_Search");
//! assert_eq!(definition.input_schema.required, vec!["input"]);
//! ```

mod normalize;
mod sanitize;
mod serialize;

pub use normalize::{SchemaNormalizer, normalize};
pub use sanitize::{MAX_NAME_LEN, placeholder_name, sanitize_name};
pub use serialize::{registration_payload, registration_schema};
