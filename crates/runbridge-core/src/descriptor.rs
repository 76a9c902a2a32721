//! Tool descriptors as served by the remote service, and the normalized
//! definitions the bridge registers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Raw description of a remote app. Every field except `name` may be absent
/// and `input_schema` may be arbitrarily malformed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Identifier the remote service expects on submission
    #[serde(default, alias = "app_id", alias = "appId", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(
        default,
        alias = "input_schema",
        alias = "parameters",
        skip_serializing_if = "Option::is_none"
    )]
    pub input_schema: Option<Value>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            input_schema: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_input_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }

    /// Identifier used when submitting runs: the explicit id, else the raw name
    pub fn remote_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }
}

/// The only parameter types a registered tool exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Number,
    Boolean,
}

impl PrimitiveType {
    /// Map a JSON-schema `type` value onto a primitive, defaulting to string.
    ///
    /// Union types such as `["integer", "null"]` take their first non-null member.
    pub fn from_schema_type(declared: Option<&Value>) -> Self {
        match declared {
            Some(Value::String(name)) => Self::from_name(name),
            Some(Value::Array(names)) => names
                .iter()
                .filter_map(Value::as_str)
                .find(|name| *name != "null")
                .map(Self::from_name)
                .unwrap_or(PrimitiveType::String),
            _ => PrimitiveType::String,
        }
    }

    fn from_name(name: &str) -> Self {
        match name {
            "number" | "integer" => PrimitiveType::Number,
            "boolean" => PrimitiveType::Boolean,
            _ => PrimitiveType::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::String => "string",
            PrimitiveType::Number => "number",
            PrimitiveType::Boolean => "boolean",
        }
    }
}

impl std::fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub kind: PrimitiveType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertySchema {
    pub fn new(kind: PrimitiveType) -> Self {
        Self {
            kind,
            description: None,
        }
    }
}

/// Strict object schema: primitive properties only, no extra keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSchema {
    #[serde(rename = "type")]
    pub kind: String,

    pub properties: BTreeMap<String, PropertySchema>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    pub additional_properties: bool,
}

impl InputSchema {
    pub fn new(properties: BTreeMap<String, PropertySchema>, required: Vec<String>) -> Self {
        Self {
            kind: "object".to_string(),
            properties,
            required,
            additional_properties: false,
        }
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }
}

/// A normalized tool ready for registration.
///
/// `name` always matches `^[A-Za-z0-9_-]{1,64}$`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
}
