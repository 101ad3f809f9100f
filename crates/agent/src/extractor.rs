//! Tool-call extraction from model replies.
//!
//! Backends without native function calling are taught a plain-text
//! protocol in the system prompt and answer with markers like:
//!
//! ```text
//! TOOL_CALL: search_products
//! ARGUMENTS: {"query": "notebook"}
//! ```
//!
//! The [`ToolCallExtractor`] trait is the seam where a structured
//! (function-calling) variant would plug in; both produce the same
//! [`ToolCall`] shape.

use agentloom_core::tool::ToolCall;
use regex_lite::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::warn;

/// The result of scanning one reply.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Reply text with every extracted marker removed, trimmed
    pub text: String,

    /// Calls in textual order
    pub calls: Vec<ToolCall>,

    /// Markers whose arguments were not a JSON object
    pub dropped: usize,
}

pub trait ToolCallExtractor: Send + Sync {
    /// Split a reply into visible text and tool calls. Never fails:
    /// malformed calls are counted in [`Extraction::dropped`].
    fn extract(&self, reply: &str) -> Extraction;

    /// Instructions appended to the system prompt telling the model how to
    /// request a tool.
    fn protocol_instructions(&self) -> String;
}

/// Marker header: the tool name line, then the `ARGUMENTS:` label.
static MARKER_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"TOOL_CALL:\s*(\w+)\s*\nARGUMENTS:\s*").expect("marker pattern is valid")
});

/// The two-line `TOOL_CALL:` / `ARGUMENTS:` text protocol.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerExtractor;

impl ToolCallExtractor for MarkerExtractor {
    fn extract(&self, reply: &str) -> Extraction {
        let mut text = String::with_capacity(reply.len());
        let mut calls = Vec::new();
        let mut dropped = 0;

        // `kept_from` is where the next stretch of visible text begins.
        let mut kept_from = 0;
        let mut search_from = 0;

        while let Some(caps) = MARKER_HEADER.captures_at(reply, search_from) {
            let (Some(header), Some(name)) = (caps.get(0), caps.get(1)) else {
                break;
            };

            match leading_object(&reply[header.end()..]) {
                Some((arguments, len)) => {
                    text.push_str(&reply[kept_from..header.start()]);
                    kept_from = header.end() + len;
                    search_from = kept_from;
                    calls.push(ToolCall::new(name.as_str(), arguments));
                }
                None => {
                    dropped += 1;
                    warn!(tool = %name.as_str(), "Ignoring tool call with malformed arguments");
                    search_from = header.end();
                }
            }
        }
        text.push_str(&reply[kept_from..]);

        Extraction {
            text: text.trim().to_string(),
            calls,
            dropped,
        }
    }

    fn protocol_instructions(&self) -> String {
        concat!(
            "To use a tool, reply with this exact format:\n",
            "\n",
            "TOOL_CALL: tool_name\n",
            "ARGUMENTS: {\"param1\": \"value1\", \"param2\": \"value2\"}\n",
            "\n",
            "You can call several tools by repeating this format.\n",
            "After receiving the tool results, give your final answer to the user, ",
            "naturally and briefly."
        )
        .to_string()
    }
}

/// Parse a JSON object at the very start of `input`, returning it and the
/// number of bytes it spans. Nested objects are allowed.
fn leading_object(input: &str) -> Option<(Map<String, Value>, usize)> {
    if !input.starts_with('{') {
        return None;
    }
    let mut stream = serde_json::Deserializer::from_str(input).into_iter::<Map<String, Value>>();
    match stream.next() {
        Some(Ok(object)) => Some((object, stream.byte_offset())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract(reply: &str) -> Extraction {
        MarkerExtractor.extract(reply)
    }

    #[test]
    fn plain_reply_has_no_calls() {
        let out = extract("  Sim, temos notebooks.  ");
        assert!(out.calls.is_empty());
        assert_eq!(out.dropped, 0);
        assert_eq!(out.text, "Sim, temos notebooks.");
    }

    #[test]
    fn single_marker_is_extracted_and_removed() {
        let out = extract("TOOL_CALL: search_products\nARGUMENTS: {\"query\":\"notebook\"}");
        assert_eq!(out.calls.len(), 1);
        assert_eq!(out.calls[0].name, "search_products");
        assert_eq!(out.calls[0].arguments["query"], "notebook");
        assert!(out.calls[0].result.is_none());
        assert_eq!(out.text, "");
    }

    #[test]
    fn surrounding_text_is_preserved() {
        let reply = "Vou verificar.\nTOOL_CALL: check_stock\nARGUMENTS: {\"productId\": \"prod-001\"}\nUm momento.";
        let out = extract(reply);
        assert_eq!(out.calls.len(), 1);
        assert_eq!(out.text, "Vou verificar.\n\nUm momento.");
    }

    #[test]
    fn multiple_markers_keep_textual_order_and_unique_ids() {
        let reply = "TOOL_CALL: search_products\nARGUMENTS: {\"query\": \"mouse\"}\n\
                     TOOL_CALL: check_stock\nARGUMENTS: {\"productId\": \"prod-002\"}\n\
                     TOOL_CALL: get_current_time\nARGUMENTS: {}";
        let out = extract(reply);
        let names: Vec<&str> = out.calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["search_products", "check_stock", "get_current_time"]);
        assert_ne!(out.calls[0].id, out.calls[1].id);
        assert_ne!(out.calls[1].id, out.calls[2].id);
        assert!(out.calls[2].arguments.is_empty());
        assert_eq!(out.text, "");
    }

    #[test]
    fn nested_arguments_are_supported() {
        let reply = "TOOL_CALL: save_log\nARGUMENTS: {\"level\": \"info\", \"message\": \"ok\", \"metadata\": {\"orderId\": 42, \"tags\": [\"a\"]}} done";
        let out = extract(reply);
        assert_eq!(out.calls.len(), 1);
        assert_eq!(
            Value::Object(out.calls[0].arguments.clone()),
            json!({"level": "info", "message": "ok", "metadata": {"orderId": 42, "tags": ["a"]}})
        );
        assert_eq!(out.text, "done");
    }

    #[test]
    fn whitespace_around_marker_is_tolerated() {
        let out = extract("TOOL_CALL:   check_stock   \nARGUMENTS:{\"productId\":\"prod-003\"}");
        assert_eq!(out.calls.len(), 1);
        assert_eq!(out.calls[0].name, "check_stock");
    }

    #[test]
    fn malformed_arguments_are_dropped_and_counted() {
        let reply = "TOOL_CALL: search_products\nARGUMENTS: {query: notebook}";
        let out = extract(reply);
        assert!(out.calls.is_empty());
        assert_eq!(out.dropped, 1);
        // Nothing was extracted, so the reply is left as written.
        assert_eq!(out.text, reply);
    }

    #[test]
    fn non_object_arguments_are_dropped() {
        let out = extract("TOOL_CALL: search_products\nARGUMENTS: [\"notebook\"]");
        assert!(out.calls.is_empty());
        assert_eq!(out.dropped, 1);
    }

    #[test]
    fn malformed_marker_does_not_hide_a_later_good_one() {
        let reply = "TOOL_CALL: a\nARGUMENTS: {oops}\nTOOL_CALL: b\nARGUMENTS: {\"x\": 1}";
        let out = extract(reply);
        assert_eq!(out.dropped, 1);
        assert_eq!(out.calls.len(), 1);
        assert_eq!(out.calls[0].name, "b");
        assert_eq!(out.text, "TOOL_CALL: a\nARGUMENTS: {oops}");
    }

    #[test]
    fn marker_must_span_two_lines() {
        let out = extract("TOOL_CALL: search_products ARGUMENTS: {\"query\": \"x\"}");
        assert!(out.calls.is_empty());
        assert_eq!(out.dropped, 0);
    }

    #[test]
    fn instructions_show_marker_syntax() {
        let text = MarkerExtractor.protocol_instructions();
        assert!(text.contains("TOOL_CALL: tool_name\nARGUMENTS: {"));
    }
}
