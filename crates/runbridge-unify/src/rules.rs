//! The individual shape rules, in the order the unifier applies them.

use runbridge_core::{ContentBlock, NO_RESPONSE_MESSAGE};
use serde_json::Value;

/// What a matching rule does with the value
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Final content; no later rule runs
    Done(Vec<ContentBlock>),
    /// Continue with the remaining rules on this inner value
    Unwrap(Value),
}

/// A named predicate and transform over a raw result
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&Value) -> Option<Step>,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Rule").field(&self.name).finish()
    }
}

pub const CONTENT_PASSTHROUGH: Rule = Rule {
    name: "content_passthrough",
    apply: content_passthrough,
};

pub const OUTPUT_UNWRAP: Rule = Rule {
    name: "output_unwrap",
    apply: output_unwrap,
};

pub const TEXT_FIELD: Rule = Rule {
    name: "text_field",
    apply: text_field,
};

pub const HTML_FIELD: Rule = Rule {
    name: "html_field",
    apply: html_field,
};

pub const DATA_FIELD: Rule = Rule {
    name: "data_field",
    apply: data_field,
};

pub const BARE_STRING: Rule = Rule {
    name: "bare_string",
    apply: bare_string,
};

pub const PRETTY_JSON: Rule = Rule {
    name: "pretty_json",
    apply: pretty_json,
};

/// `{"content": [...]}` whose entries are all content blocks. Entry fields
/// beyond the body are carried along.
fn content_passthrough(value: &Value) -> Option<Step> {
    let entries = value.get("content")?.as_array()?;
    if entries.is_empty() {
        return None;
    }
    entries
        .iter()
        .map(|entry| serde_json::from_value::<ContentBlock>(entry.clone()).ok())
        .collect::<Option<Vec<_>>>()
        .map(Step::Done)
}

/// `{"output": x}`, or `{"<first key>": {"output": x}}`. Keys keep the
/// payload's order, so the first key is the first one the service sent.
fn output_unwrap(value: &Value) -> Option<Step> {
    let object = value.as_object()?;
    if let Some(output) = object.get("output").filter(|v| !v.is_null()) {
        return Some(Step::Unwrap(output.clone()));
    }
    object
        .values()
        .next()?
        .get("output")
        .filter(|v| !v.is_null())
        .map(|output| Step::Unwrap(output.clone()))
}

fn text_field(value: &Value) -> Option<Step> {
    let field = present(value, "markdown").or_else(|| present(value, "text"))?;
    Some(Step::Done(vec![ContentBlock::text(render(field))]))
}

fn html_field(value: &Value) -> Option<Step> {
    let field = present(value, "html")?;
    Some(Step::Done(vec![ContentBlock::html(render(field))]))
}

fn data_field(value: &Value) -> Option<Step> {
    let field = present(value, "data")?;
    Some(Step::Done(vec![ContentBlock::text(render(field))]))
}

/// A field that is set to something other than `null`
fn present<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.as_object()?.get(key).filter(|v| !v.is_null())
}

fn bare_string(value: &Value) -> Option<Step> {
    value
        .as_str()
        .map(|text| Step::Done(vec![ContentBlock::text(text)]))
}

/// Always matches
fn pretty_json(value: &Value) -> Option<Step> {
    let text = match value {
        Value::Null => NO_RESPONSE_MESSAGE.to_string(),
        other => render(other),
    };
    Some(Step::Done(vec![ContentBlock::text(text)]))
}

/// Strings verbatim, anything else as pretty-printed JSON
pub(crate) fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn done(rule: Rule, value: Value) -> Vec<ContentBlock> {
        match (rule.apply)(&value) {
            Some(Step::Done(blocks)) => blocks,
            other => panic!("{} did not finish on {value}: {other:?}", rule.name),
        }
    }

    #[test]
    fn test_content_passthrough() {
        let blocks = done(
            CONTENT_PASSTHROUGH,
            json!({"content": [{"type": "text", "text": "hi"}, {"type": "html", "html": "<p/>"}]}),
        );
        assert_eq!(blocks, vec![ContentBlock::text("hi"), ContentBlock::html("<p/>")]);
    }

    #[test]
    fn test_content_passthrough_rejects_foreign_entries() {
        let apply = CONTENT_PASSTHROUGH.apply;
        assert!(apply(&json!({"content": []})).is_none());
        assert!(apply(&json!({"content": [{"type": "image", "data": "..."}]})).is_none());
        assert!(apply(&json!({"content": "not an array"})).is_none());
    }

    #[test]
    fn test_output_unwrap() {
        let apply = OUTPUT_UNWRAP.apply;
        assert_eq!(
            apply(&json!({"output": {"text": "x"}})),
            Some(Step::Unwrap(json!({"text": "x"})))
        );
        assert_eq!(
            apply(&json!({"node_1": {"output": "deep"}})),
            Some(Step::Unwrap(json!("deep")))
        );
        assert_eq!(apply(&json!({"output": null})), None);
        assert_eq!(apply(&json!({"meta": {"ms": 5}, "result": {"output": "x"}})), None);
        assert_eq!(apply(&json!("output")), None);
    }

    #[test]
    fn test_output_unwrap_uses_payload_order() {
        let raw: Value =
            serde_json::from_str(r#"{"result": {"output": "answer"}, "meta": {"ms": 5}}"#).unwrap();
        assert_eq!(
            (OUTPUT_UNWRAP.apply)(&raw),
            Some(Step::Unwrap(json!("answer")))
        );
    }

    #[test]
    fn test_content_passthrough_keeps_entry_fields() {
        let blocks = done(
            CONTENT_PASSTHROUGH,
            json!({"content": [{"type": "text", "text": "hi", "annotations": {"priority": 1.0}}]}),
        );
        assert_eq!(
            serde_json::to_value(&blocks).unwrap(),
            json!([{"type": "text", "text": "hi", "annotations": {"priority": 1.0}}])
        );
    }

    #[test]
    fn test_null_fields_do_not_match() {
        let blocks = done(TEXT_FIELD, json!({"markdown": null, "text": "hi"}));
        assert_eq!(blocks, vec![ContentBlock::text("hi")]);

        assert!((TEXT_FIELD.apply)(&json!({"text": null})).is_none());
        assert!((HTML_FIELD.apply)(&json!({"html": null})).is_none());
        assert!((DATA_FIELD.apply)(&json!({"data": null})).is_none());
    }

    #[test]
    fn test_markdown_wins_over_text() {
        let blocks = done(TEXT_FIELD, json!({"markdown": "# md", "text": "plain"}));
        assert_eq!(blocks, vec![ContentBlock::text("# md")]);
    }

    #[test]
    fn test_non_string_fields_are_pretty_printed() {
        let blocks = done(DATA_FIELD, json!({"data": {"rows": [1]}}));
        assert_eq!(blocks[0].body(), "{\n  \"rows\": [\n    1\n  ]\n}");

        let blocks = done(TEXT_FIELD, json!({"text": 42}));
        assert_eq!(blocks, vec![ContentBlock::text("42")]);
    }

    #[test]
    fn test_html_field() {
        let blocks = done(HTML_FIELD, json!({"html": "<h1>hi</h1>"}));
        assert_eq!(blocks, vec![ContentBlock::html("<h1>hi</h1>")]);
    }

    #[test]
    fn test_pretty_json_null_placeholder() {
        assert_eq!(
            done(PRETTY_JSON, Value::Null),
            vec![ContentBlock::text(NO_RESPONSE_MESSAGE)]
        );
        assert_eq!(done(PRETTY_JSON, json!(true)), vec![ContentBlock::text("true")]);
    }
}
