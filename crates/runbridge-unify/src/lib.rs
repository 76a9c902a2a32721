//! # runbridge unify
//!
//! Turns whatever shape a run's outputs take into an ordered, non-empty list
//! of [`ContentBlock`]s. Never fails; unknown shapes degrade to pretty JSON.
//!
//! ```
//! use runbridge_core::ContentBlock;
//! use runbridge_unify::unify;
//! use serde_json::json;
//!
//! assert_eq!(unify(&json!({"markdown": "# hi"})), vec![ContentBlock::text("# hi")]);
//! assert_eq!(unify(&json!({"output": "plain"})), vec![ContentBlock::text("plain")]);
//! ```

mod rules;

pub use rules::{
    BARE_STRING, CONTENT_PASSTHROUGH, DATA_FIELD, HTML_FIELD, OUTPUT_UNWRAP, PRETTY_JSON, Rule,
    Step, TEXT_FIELD,
};

use runbridge_core::{ContentBlock, NO_RESPONSE_MESSAGE};
use serde_json::Value;
use tracing::trace;

/// Ordered rule pipeline. The first rule that returns [`Step::Done`] decides
/// the output; [`Step::Unwrap`] replaces the value for the rules after it.
#[derive(Debug, Clone)]
pub struct ResponseUnifier {
    rules: Vec<Rule>,
}

impl ResponseUnifier {
    pub fn new() -> Self {
        Self {
            rules: vec![
                CONTENT_PASSTHROUGH,
                OUTPUT_UNWRAP,
                TEXT_FIELD,
                HTML_FIELD,
                DATA_FIELD,
                BARE_STRING,
                PRETTY_JSON,
            ],
        }
    }

    /// Custom pipeline. Output is still never empty: if no rule finishes,
    /// the value is pretty-printed.
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|rule| rule.name)
    }

    pub fn unify(&self, raw: &Value) -> Vec<ContentBlock> {
        let mut current = raw.clone();

        for rule in &self.rules {
            match (rule.apply)(&current) {
                Some(Step::Done(blocks)) if !blocks.is_empty() => {
                    trace!(rule = rule.name, blocks = blocks.len(), "Unified run output");
                    return blocks;
                }
                Some(Step::Done(_)) => {}
                Some(Step::Unwrap(inner)) => {
                    trace!(rule = rule.name, "Unwrapped run output");
                    current = inner;
                }
                None => {}
            }
        }

        match current {
            Value::Null => vec![ContentBlock::text(NO_RESPONSE_MESSAGE)],
            other => vec![ContentBlock::text(rules::render(&other))],
        }
    }
}

impl Default for ResponseUnifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Unify with the default rule pipeline
pub fn unify(raw: &Value) -> Vec<ContentBlock> {
    ResponseUnifier::new().unify(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_array_passes_through() {
        let raw = json!({"content": [{"type": "text", "text": "hi"}]});
        assert_eq!(unify(&raw), vec![ContentBlock::text("hi")]);
    }

    #[test]
    fn test_markdown() {
        assert_eq!(unify(&json!({"markdown": "# hi"})), vec![ContentBlock::text("# hi")]);
    }

    #[test]
    fn test_plain_string() {
        assert_eq!(unify(&json!("plain")), vec![ContentBlock::text("plain")]);
    }

    #[test]
    fn test_null_placeholder() {
        assert_eq!(
            unify(&Value::Null),
            vec![ContentBlock::text("No response received from the tool.")]
        );
    }

    #[test]
    fn test_nested_output_then_text() {
        let raw = json!({"llm_node": {"output": {"text": "answer"}}});
        assert_eq!(unify(&raw), vec![ContentBlock::text("answer")]);
    }

    #[test]
    fn test_nested_output_under_first_sent_key() {
        let raw: Value =
            serde_json::from_str(r#"{"result": {"output": "answer"}, "meta": {"ms": 5}}"#).unwrap();
        assert_eq!(unify(&raw), vec![ContentBlock::text("answer")]);
    }

    #[test]
    fn test_null_fields_fall_through_the_ladder() {
        let raw = json!({"markdown": null, "html": null, "data": "rows"});
        assert_eq!(unify(&raw), vec![ContentBlock::text("rows")]);
    }

    #[test]
    fn test_output_then_html() {
        let raw = json!({"output": {"html": "<p>x</p>"}});
        assert_eq!(unify(&raw), vec![ContentBlock::html("<p>x</p>")]);
    }

    #[test]
    fn test_unwrapped_string() {
        assert_eq!(unify(&json!({"output": "direct"})), vec![ContentBlock::text("direct")]);
    }

    #[test]
    fn test_data_string_verbatim() {
        assert_eq!(unify(&json!({"data": "csv,row"})), vec![ContentBlock::text("csv,row")]);
    }

    #[test]
    fn test_fallback_pretty_json() {
        let raw = json!({"score": 0.9});
        assert_eq!(
            unify(&raw),
            vec![ContentBlock::text("{\n  \"score\": 0.9\n}")]
        );
        assert_eq!(unify(&json!([1, 2])), vec![ContentBlock::text("[\n  1,\n  2\n]")]);
    }

    #[test]
    fn test_custom_pipeline_never_empty() {
        let unifier = ResponseUnifier::with_rules(vec![OUTPUT_UNWRAP]);
        assert_eq!(unifier.unify(&json!({"output": "x"})), vec![ContentBlock::text("x")]);
        assert_eq!(
            unifier.unify(&Value::Null),
            vec![ContentBlock::text(NO_RESPONSE_MESSAGE)]
        );
    }

    #[test]
    fn test_default_rule_order() {
        let names: Vec<_> = ResponseUnifier::new().rules().collect();
        assert_eq!(names.first(), Some(&"content_passthrough"));
        assert_eq!(names.last(), Some(&"pretty_json"));
    }
}
