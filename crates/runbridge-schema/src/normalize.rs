//! Descriptor normalization.
//!
//! Remote descriptors come from many app authors and are frequently missing
//! or malformed. [`SchemaNormalizer::normalize`] is total: every descriptor
//! yields a definition with a valid name, a non-empty description and a
//! strict object schema whose properties are all primitives.

use crate::sanitize::{placeholder_name, sanitize_name};
use runbridge_core::config::SchemaConfig;
use runbridge_core::{
    InputSchema, PrimitiveType, PropertySchema, RequiredPolicy, ToolDefinition, ToolDescriptor,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Normalizes raw descriptors into registrable tool definitions
#[derive(Debug, Clone)]
pub struct SchemaNormalizer {
    default_property: String,
    sentinel_properties: Vec<String>,
    required_policy: RequiredPolicy,
}

impl SchemaNormalizer {
    pub fn new() -> Self {
        Self::from_config(&SchemaConfig::default())
    }

    pub fn from_config(config: &SchemaConfig) -> Self {
        Self {
            default_property: config.default_property.clone(),
            sentinel_properties: config.sentinel_properties.clone(),
            required_policy: config.required_policy,
        }
    }

    /// Name of the single property used by the fallback schema
    pub fn with_default_property(mut self, name: impl Into<String>) -> Self {
        self.default_property = name.into();
        self
    }

    pub fn with_sentinel(mut self, name: impl Into<String>) -> Self {
        self.sentinel_properties.push(name.into());
        self
    }

    pub fn with_required_policy(mut self, policy: RequiredPolicy) -> Self {
        self.required_policy = policy;
        self
    }

    pub fn default_property(&self) -> &str {
        &self.default_property
    }

    /// Normalize one descriptor. Never fails.
    pub fn normalize(&self, descriptor: &ToolDescriptor) -> ToolDefinition {
        let name = sanitize_name(&descriptor.name).unwrap_or_else(|| {
            let placeholder = placeholder_name(&descriptor.name);
            debug!(
                raw = %descriptor.name,
                placeholder = %placeholder,
                "Tool name sanitized to nothing, using placeholder"
            );
            placeholder
        });

        let description = match descriptor.description.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => format!("Run the '{}' app", descriptor.name.trim()),
        };

        let input_schema = match self.recover_properties(descriptor.input_schema.as_ref()) {
            Some(properties) => {
                let required = self.required_for(descriptor.input_schema.as_ref(), &properties);
                InputSchema::new(properties, required)
            }
            None => {
                debug!(tool = %name, "No usable properties, substituting default schema");
                self.default_schema()
            }
        };

        ToolDefinition {
            name,
            description,
            input_schema,
        }
    }

    /// Properties worth exposing, or `None` when the fallback schema applies
    fn recover_properties(
        &self,
        schema: Option<&Value>,
    ) -> Option<BTreeMap<String, PropertySchema>> {
        let declared = schema?.get("properties")?.as_object()?;

        if declared.is_empty() || self.is_sentinel_only(declared) {
            return None;
        }

        let properties = declared
            .iter()
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, property)| {
                let kind = PrimitiveType::from_schema_type(property.get("type"));
                let description = property
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                (name.clone(), PropertySchema { kind, description })
            })
            .collect::<BTreeMap<_, _>>();

        if properties.is_empty() { None } else { Some(properties) }
    }

    fn is_sentinel_only(&self, declared: &Map<String, Value>) -> bool {
        declared.len() == 1
            && declared
                .keys()
                .all(|key| self.sentinel_properties.iter().any(|s| s == key))
    }

    fn required_for(
        &self,
        schema: Option<&Value>,
        properties: &BTreeMap<String, PropertySchema>,
    ) -> Vec<String> {
        let every_property = || properties.keys().cloned().collect::<Vec<_>>();

        match self.required_policy {
            RequiredPolicy::Recompute => every_property(),
            RequiredPolicy::Inherit => {
                let inherited = schema
                    .and_then(|s| s.get("required"))
                    .and_then(Value::as_array)
                    .map(|names| {
                        names
                            .iter()
                            .filter_map(Value::as_str)
                            .filter(|name| properties.contains_key(*name))
                            .map(str::to_string)
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();

                if inherited.is_empty() {
                    every_property()
                } else {
                    inherited
                }
            }
        }
    }

    /// One required string property
    fn default_schema(&self) -> InputSchema {
        let mut properties = BTreeMap::new();
        properties.insert(
            self.default_property.clone(),
            PropertySchema::new(PrimitiveType::String),
        );
        InputSchema::new(properties, vec![self.default_property.clone()])
    }
}

impl Default for SchemaNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize with default settings
pub fn normalize(descriptor: &ToolDescriptor) -> ToolDefinition {
    SchemaNormalizer::default().normalize(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_default_schema(definition: &ToolDefinition, property: &str) {
        let schema = &definition.input_schema;
        assert_eq!(schema.properties.len(), 1);
        assert_eq!(schema.properties[property].kind, PrimitiveType::String);
        assert_eq!(schema.required, vec![property.to_string()]);
        assert!(!schema.additional_properties);
    }

    #[test]
    fn test_missing_schema_gets_default() {
        let definition = normalize(&ToolDescriptor::new("Summarizer"));
        assert_default_schema(&definition, "input");
    }

    #[test]
    fn test_malformed_schemas_get_default() {
        let malformed = [
            json!("not an object"),
            json!({"type": "object"}),
            json!({"properties": []}),
            json!({"properties": "text"}),
            json!({"properties": {}}),
        ];

        for schema in malformed {
            let descriptor = ToolDescriptor::new("tool").with_input_schema(schema.clone());
            assert_default_schema(&normalize(&descriptor), "input");
        }
    }

    #[test]
    fn test_sentinel_only_schema_gets_default() {
        let descriptor = ToolDescriptor::new("Web Search!").with_input_schema(json!({
            "type": "object",
            "properties": {"random_string": {"type": "string", "description": "Dummy"}}
        }));

        let definition = normalize(&descriptor);
        assert_eq!(definition.name, "Web_Search");
        assert_default_schema(&definition, "input");
        assert!(!definition.input_schema.properties.contains_key("random_string"));
    }

    #[test]
    fn test_sentinel_alongside_real_properties_is_kept() {
        let descriptor = ToolDescriptor::new("tool").with_input_schema(json!({
            "properties": {
                "random_string": {"type": "string"},
                "topic": {"type": "string"}
            }
        }));

        let definition = normalize(&descriptor);
        assert_eq!(definition.input_schema.properties.len(), 2);
    }

    #[test]
    fn test_query_convention() {
        let normalizer = SchemaNormalizer::new().with_default_property("query");
        let definition = normalizer.normalize(&ToolDescriptor::new("search"));
        assert_default_schema(&definition, "query");
    }

    #[test]
    fn test_property_types_are_coerced_to_primitives() {
        let descriptor = ToolDescriptor::new("tool").with_input_schema(json!({
            "properties": {
                "count": {"type": "integer"},
                "ratio": {"type": "number", "description": "Between 0 and 1"},
                "verbose": {"type": "boolean"},
                "tags": {"type": "array", "items": {"type": "string"}},
                "options": {"type": "object"},
                "untyped": {},
                "weird": 42
            }
        }));

        let properties = normalize(&descriptor).input_schema.properties;
        assert_eq!(properties["count"].kind, PrimitiveType::Number);
        assert_eq!(properties["ratio"].kind, PrimitiveType::Number);
        assert_eq!(properties["ratio"].description.as_deref(), Some("Between 0 and 1"));
        assert_eq!(properties["verbose"].kind, PrimitiveType::Boolean);
        assert_eq!(properties["tags"].kind, PrimitiveType::String);
        assert_eq!(properties["options"].kind, PrimitiveType::String);
        assert_eq!(properties["untyped"].kind, PrimitiveType::String);
        assert_eq!(properties["weird"].kind, PrimitiveType::String);
    }

    #[test]
    fn test_required_recomputed_by_default() {
        let descriptor = ToolDescriptor::new("tool").with_input_schema(json!({
            "properties": {"a": {"type": "string"}, "b": {"type": "string"}},
            "required": ["a"]
        }));

        let definition = normalize(&descriptor);
        assert_eq!(definition.input_schema.required, vec!["a", "b"]);
    }

    #[test]
    fn test_required_inherited_when_configured() {
        let normalizer = SchemaNormalizer::new().with_required_policy(RequiredPolicy::Inherit);
        let descriptor = ToolDescriptor::new("tool").with_input_schema(json!({
            "properties": {"a": {"type": "string"}, "b": {"type": "string"}},
            "required": ["a", "ghost"]
        }));
        assert_eq!(normalizer.normalize(&descriptor).input_schema.required, vec!["a"]);

        let descriptor = ToolDescriptor::new("tool").with_input_schema(json!({
            "properties": {"a": {"type": "string"}, "b": {"type": "string"}},
            "required": []
        }));
        assert_eq!(
            normalizer.normalize(&descriptor).input_schema.required,
            vec!["a", "b"]
        );
    }

    #[test]
    fn test_additional_properties_forced_false() {
        let descriptor = ToolDescriptor::new("tool").with_input_schema(json!({
            "properties": {"a": {"type": "string"}},
            "additionalProperties": true
        }));
        assert!(!normalize(&descriptor).input_schema.additional_properties);
    }

    #[test]
    fn test_description_is_never_dropped() {
        let descriptor = ToolDescriptor::new("Summarizer").with_description("  Summarize text  ");
        assert_eq!(normalize(&descriptor).description, "Summarize text");

        let descriptor = ToolDescriptor::new("Summarizer").with_description("");
        assert_eq!(normalize(&descriptor).description, "Run the 'Summarizer' app");
    }

    #[test]
    fn test_unusable_name_gets_placeholder() {
        let definition = normalize(&ToolDescriptor::new("???"));
        assert!(definition.name.starts_with("tool_"));
        assert_eq!(definition.name, normalize(&ToolDescriptor::new("???")).name);
    }

    #[test]
    fn test_normalizing_twice_keeps_name() {
        let first = normalize(&ToolDescriptor::new("My  Fancy App (beta)"));
        let second = normalize(&ToolDescriptor::new(first.name.clone()));
        assert_eq!(first.name, "My_Fancy_App_beta");
        assert_eq!(first.name, second.name);
    }
}
