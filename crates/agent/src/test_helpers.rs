//! Shared test helpers for orchestrator tests.

use agentloom_core::error::{ModelError, ToolError};
use agentloom_core::model::{ChatRequest, FragmentReceiver, ModelClient};
use agentloom_core::tool::{ParamType, Tool, ToolParameter};
use agentloom_core::{Error, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::sink::EventSink;
use crate::stream_event::StreamEvent;

/// A mock model client that returns a sequence of scripted replies.
///
/// Each call pops the next reply; once the script has a single entry left
/// and `repeat_last` is set, that entry is returned forever. Panics if more
/// calls are made than replies provided. Streaming calls deliver the reply
/// in whitespace-delimited fragments.
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    repeat_last: bool,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<Result<String, ModelError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            repeat_last: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    /// Returns `reply` on every call.
    pub fn always(reply: &str) -> Self {
        Self {
            repeat_last: true,
            ..Self::texts(&[reply])
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self, request: ChatRequest) -> Result<String, ModelError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request);
        let mut replies = self.replies.lock().unwrap();

        if self.repeat_last && replies.len() == 1 {
            return replies[0].clone();
        }
        replies.pop_front().unwrap_or_else(|| {
            panic!(
                "ScriptedClient: no more replies (call #{})",
                requests.len()
            )
        })
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ModelError> {
        self.next_reply(request)
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<FragmentReceiver, ModelError> {
        let reply = self.next_reply(request)?;
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(async move {
            for fragment in reply.split_inclusive(' ') {
                if tx.send(Ok(fragment.to_string())).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }
}

/// Echoes its `key` argument back inside a JSON object.
pub struct LookupTool;

#[async_trait]
impl Tool for LookupTool {
    fn name(&self) -> &str {
        "lookup"
    }

    fn description(&self) -> &str {
        "Looks up a key"
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![ToolParameter::required("key", ParamType::String, "The key")]
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let key = arguments
            .get("key")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'key' argument".into()))?;
        Ok(serde_json::json!({ "key": key, "found": true }))
    }
}

/// Fails on every call.
pub struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "always_fails"
    }

    fn description(&self) -> &str {
        "Never works"
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        Vec::new()
    }

    async fn execute(&self, _arguments: Map<String, Value>) -> Result<Value, ToolError> {
        Err(ToolError::ExecutionFailed {
            tool_name: "always_fails".into(),
            reason: "database offline".into(),
        })
    }
}

/// Collects events; optionally hangs up after `limit` of them.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<StreamEvent>,
    pub limit: Option<usize>,
}

impl RecordingSink {
    pub fn hang_up_after(limit: usize) -> Self {
        Self {
            events: Vec::new(),
            limit: Some(limit),
        }
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.iter().map(StreamEvent::event_type).collect()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn emit(&mut self, event: StreamEvent) -> Result<()> {
        if self.limit.is_some_and(|limit| self.events.len() >= limit) {
            return Err(Error::StreamClosed);
        }
        self.events.push(event);
        Ok(())
    }
}

/// A `TOOL_CALL` marker for `tool` with the given JSON arguments.
pub fn marker(tool: &str, arguments: Value) -> String {
    format!("TOOL_CALL: {tool}\nARGUMENTS: {arguments}")
}
