//! Tool definitions offered to the assistant.

use super::types::Tool;

pub const SEARCH_WIKIPEDIA: &str = "search_wikipedia";

/// Build the set of tools available to the assistant.
///
/// Empty when the Wikipedia plugin is disabled.
#[must_use]
pub fn agent_tools(wikipedia_enabled: bool) -> Vec<Tool> {
    if !wikipedia_enabled {
        return Vec::new();
    }
    vec![Tool {
        name: SEARCH_WIKIPEDIA.into(),
        description: "Search Wikipedia and return the best matching article titles, snippets and links. \
                      Use it for factual questions about people, places, events or concepts."
            .into(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search terms" },
                "limit": { "type": "integer", "description": "Maximum number of articles (1-10, default 3)" }
            },
            "required": ["query"]
        }),
    }]
}
