//! Wire types for the remote service's JSON bodies.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One page of the tool listing. Records are kept raw so a single malformed
/// descriptor cannot fail the whole page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolPage {
    #[serde(default, alias = "apps", alias = "items", alias = "data")]
    pub tools: Vec<Value>,

    #[serde(default, alias = "next_cursor", alias = "cursor")]
    pub next_cursor: Option<String>,
}

/// Listing response: either a paginated envelope or a bare array
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse {
    Bare(Vec<Value>),
    Page(ToolPage),
}

impl ListResponse {
    /// Split into records and the cursor for the next page, if any
    pub fn into_parts(self) -> (Vec<Value>, Option<String>) {
        match self {
            ListResponse::Page(page) => {
                let cursor = page.next_cursor.filter(|c| !c.is_empty());
                (page.tools, cursor)
            }
            ListResponse::Bare(records) => (records, None),
        }
    }
}

/// Body of `POST runs`
#[derive(Debug, Clone, Serialize)]
pub struct SubmitRunRequest<'a> {
    pub tool: &'a str,
    pub inputs: &'a Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_aliases() {
        let response: ListResponse = serde_json::from_value(json!({
            "apps": [{"name": "a"}],
            "next_cursor": "c2"
        }))
        .unwrap();
        let (records, cursor) = response.into_parts();
        assert_eq!(records.len(), 1);
        assert_eq!(cursor.as_deref(), Some("c2"));
    }

    #[test]
    fn test_bare_array() {
        let response: ListResponse =
            serde_json::from_value(json!([{"name": "a"}, {"name": "b"}])).unwrap();
        let (records, cursor) = response.into_parts();
        assert_eq!(records.len(), 2);
        assert!(cursor.is_none());
    }

    #[test]
    fn test_empty_cursor_ends_listing() {
        let response: ListResponse =
            serde_json::from_value(json!({"tools": [], "nextCursor": ""})).unwrap();
        assert!(response.into_parts().1.is_none());
    }

    #[test]
    fn test_submit_body_shape() {
        let mut inputs = Map::new();
        inputs.insert("input".into(), json!("rust"));
        let body = serde_json::to_value(SubmitRunRequest {
            tool: "app-1",
            inputs: &inputs,
        })
        .unwrap();
        assert_eq!(body, json!({"tool": "app-1", "inputs": {"input": "rust"}}));
    }
}
