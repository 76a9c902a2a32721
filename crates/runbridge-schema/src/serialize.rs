//! The one place a definition is turned into wire JSON for registration.
//!
//! Downstream validators are strict, so the output always carries
//! `"type": "object"` and `"additionalProperties": false`, and uses the
//! camelCase keys the tool protocol expects.

use runbridge_core::ToolDefinition;
use serde_json::{Map, Value, json};

/// JSON schema object for a definition's input
pub fn registration_schema(definition: &ToolDefinition) -> Map<String, Value> {
    let schema = &definition.input_schema;

    let properties = schema
        .properties
        .iter()
        .map(|(name, property)| {
            let mut entry = Map::new();
            entry.insert("type".to_string(), json!(property.kind.as_str()));
            if let Some(description) = &property.description {
                entry.insert("description".to_string(), json!(description));
            }
            (name.clone(), Value::Object(entry))
        })
        .collect::<Map<_, _>>();

    let mut out = Map::new();
    out.insert("type".to_string(), json!("object"));
    out.insert("properties".to_string(), Value::Object(properties));
    if !schema.required.is_empty() {
        out.insert("required".to_string(), json!(schema.required));
    }
    out.insert("additionalProperties".to_string(), json!(false));
    out
}

/// Full tool entry: name, description and input schema
pub fn registration_payload(definition: &ToolDefinition) -> Value {
    json!({
        "name": definition.name,
        "description": definition.description,
        "inputSchema": Value::Object(registration_schema(definition)),
    })
}
