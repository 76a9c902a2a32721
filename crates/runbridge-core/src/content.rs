use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message returned when a run produced nothing at all.
pub const NO_RESPONSE_MESSAGE: &str = "No response received from the tool.";

/// ContentBlock is the canonical unit of output handed back to the caller.
///
/// Fields other than the body (annotations, `_meta`) are kept in `extra` so
/// blocks that arrive ready-made pass through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text {
        text: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    Html {
        html: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text {
            text: text.into(),
            extra: Map::new(),
        }
    }

    pub fn html(html: impl Into<String>) -> Self {
        ContentBlock::Html {
            html: html.into(),
            extra: Map::new(),
        }
    }

    /// The textual body regardless of block kind
    pub fn body(&self) -> &str {
        match self {
            ContentBlock::Text { text, .. } => text,
            ContentBlock::Html { html, .. } => html,
        }
    }

    pub fn extra(&self) -> &Map<String, Value> {
        match self {
            ContentBlock::Text { extra, .. } | ContentBlock::Html { extra, .. } => extra,
        }
    }
}

/// Result of one tool invocation as seen across the protocol boundary.
///
/// `content` is never empty. Failures are reported in-band with `is_error`
/// set rather than as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolOutput {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(content: Vec<ContentBlock>) -> Self {
        if content.is_empty() {
            return Self {
                content: vec![ContentBlock::text(NO_RESPONSE_MESSAGE)],
                is_error: false,
            };
        }
        Self {
            content,
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(message)],
            is_error: true,
        }
    }
}
