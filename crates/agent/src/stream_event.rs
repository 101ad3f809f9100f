//! Run progress events.
//!
//! The wire shape is `{"type": <kind>, "data": {...}}`, which an HTTP layer
//! can forward to clients over SSE unchanged.

use agentloom_core::execution::Execution;
use agentloom_core::tool::ToolCall;
use serde::{Deserialize, Serialize};

/// Events emitted by the orchestrator during a streaming run.
///
/// - `start`       once, when the run begins
/// - `thinking`    at the top of every iteration
/// - `token`       each text fragment from the model
/// - `tool_calls`  a batch of calls is about to execute
/// - `tool_result` / `tool_error`  one per executed call
/// - `complete` / `error`  exactly one, always last
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum StreamEvent {
    Start { execution_id: String },

    Thinking { iteration: u32 },

    Token { chunk: String },

    ToolCalls { tool_calls: Vec<ToolCall> },

    /// `tool_call` is the tool name.
    ToolResult {
        tool_call: String,
        result: serde_json::Value,
    },

    ToolError { tool_call: String, error: String },

    Complete {
        output: String,
        execution: Box<Execution>,
    },

    Error { error: String },
}

impl StreamEvent {
    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Thinking { .. } => "thinking",
            Self::Token { .. } => "token",
            Self::ToolCalls { .. } => "tool_calls",
            Self::ToolResult { .. } => "tool_result",
            Self::ToolError { .. } => "tool_error",
            Self::Complete { .. } => "complete",
            Self::Error { .. } => "error",
        }
    }

    /// Whether this event ends the sequence.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }
}
