//! Argument checking against a normalized input schema.

use runbridge_core::{Error, InputSchema, PrimitiveType, Result};
use serde_json::{Map, Number, Value};
use tracing::debug;

/// Check `params` against `schema` and return the inputs to submit.
///
/// Required properties must be present and non-null. Values are coerced to
/// the declared primitive where unambiguous (`"3"` to a number, `"true"` to a
/// boolean, numbers and booleans to strings). Undeclared keys are dropped.
pub fn validate_params(
    schema: &InputSchema,
    mut params: Map<String, Value>,
) -> Result<Map<String, Value>> {
    let mut problems = Vec::new();
    let mut missing = Vec::new();
    let mut inputs = Map::new();

    for (name, property) in &schema.properties {
        match params.remove(name) {
            None | Some(Value::Null) => {
                if schema.is_required(name) {
                    missing.push(name.as_str());
                }
            }
            Some(value) => match coerce(property.kind, value) {
                Some(value) => {
                    inputs.insert(name.clone(), value);
                }
                None => problems.push(format!("parameter '{}' must be a {}", name, property.kind)),
            },
        }
    }

    if !params.is_empty() {
        let dropped: Vec<_> = params.keys().map(String::as_str).collect();
        debug!(dropped = ?dropped, "Dropping undeclared parameters");
    }

    if !missing.is_empty() {
        problems.insert(
            0,
            format!("missing required parameter(s): {}", missing.join(", ")),
        );
    }

    if problems.is_empty() {
        Ok(inputs)
    } else {
        Err(Error::InvalidInput(problems.join("; ")))
    }
}

fn coerce(kind: PrimitiveType, value: Value) -> Option<Value> {
    match (kind, value) {
        (PrimitiveType::String, Value::String(text)) => Some(Value::String(text)),
        (PrimitiveType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
        (PrimitiveType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),

        (PrimitiveType::Number, Value::Number(n)) => Some(Value::Number(n)),
        (PrimitiveType::Number, Value::String(text)) => parse_number(text.trim()),

        (PrimitiveType::Boolean, Value::Bool(b)) => Some(Value::Bool(b)),
        (PrimitiveType::Boolean, Value::String(text)) => {
            match text.trim().to_ascii_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            }
        }

        _ => None,
    }
}

fn parse_number(text: &str) -> Option<Value> {
    if let Ok(int) = text.parse::<i64>() {
        return Some(Value::Number(int.into()));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use runbridge_core::PropertySchema;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn schema() -> InputSchema {
        let mut properties = BTreeMap::new();
        properties.insert("query".to_string(), PropertySchema::new(PrimitiveType::String));
        properties.insert("limit".to_string(), PropertySchema::new(PrimitiveType::Number));
        properties.insert("safe".to_string(), PropertySchema::new(PrimitiveType::Boolean));
        InputSchema::new(properties, vec!["query".to_string()])
    }

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_valid_params_pass_through() {
        let inputs =
            validate_params(&schema(), params(json!({"query": "rust", "limit": 5, "safe": true})))
                .unwrap();
        assert_eq!(
            Value::Object(inputs),
            json!({"query": "rust", "limit": 5, "safe": true})
        );
    }

    #[test]
    fn test_missing_required() {
        let err = validate_params(&schema(), params(json!({"limit": 5}))).unwrap_err();
        match err {
            Error::InvalidInput(message) => {
                assert_eq!(message, "missing required parameter(s): query")
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(validate_params(&schema(), params(json!({"query": null}))).is_err());
    }

    #[test]
    fn test_string_coercion() {
        let inputs = validate_params(
            &schema(),
            params(json!({"query": 42, "limit": "10", "safe": "FALSE"})),
        )
        .unwrap();
        assert_eq!(inputs["query"], json!("42"));
        assert_eq!(inputs["limit"], json!(10));
        assert_eq!(inputs["safe"], json!(false));

        let inputs = validate_params(&schema(), params(json!({"query": "q", "limit": "2.5"}))).unwrap();
        assert_eq!(inputs["limit"], json!(2.5));
    }

    #[test]
    fn test_type_mismatch() {
        let err = validate_params(
            &schema(),
            params(json!({"query": ["a"], "limit": "many"})),
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("parameter 'limit' must be a number"));
        assert!(message.contains("parameter 'query' must be a string"));
    }

    #[test]
    fn test_undeclared_keys_dropped() {
        let inputs =
            validate_params(&schema(), params(json!({"query": "q", "extra": 1}))).unwrap();
        assert!(!inputs.contains_key("extra"));
        assert_eq!(inputs.len(), 1);
    }
}
