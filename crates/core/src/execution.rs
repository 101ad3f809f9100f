//! Execution: one end-to-end run of an agent against one input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::message::{ChatMessage, Message, Role};
use crate::tool::ToolCall;

/// Lifecycle of a run: `running` until finalized exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
}

/// The transcript and outcome of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub id: String,
    pub agent_id: String,
    pub input: String,

    /// Append-only transcript: the system prompt, the user input, then
    /// every assistant and tool turn
    pub messages: Vec<Message>,

    /// Every executed call, each carrying its result or error
    pub tool_calls: Vec<ToolCall>,

    pub status: ExecutionStatus,
    pub start_time: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Malformed tool-call markers ignored during the run
    #[serde(default, skip_serializing_if = "is_zero")]
    pub dropped_tool_calls: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl Execution {
    /// Start a run: status `running`, transcript seeded with the system
    /// prompt and the user input.
    pub fn start(
        agent_id: impl Into<String>,
        system_prompt: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        let input = input.into();
        Self {
            id: Uuid::new_v4().to_string(),
            agent_id: agent_id.into(),
            messages: vec![Message::system(system_prompt), Message::user(input.clone())],
            input,
            tool_calls: Vec::new(),
            status: ExecutionStatus::Running,
            start_time: Utc::now(),
            end_time: None,
            output: None,
            error: None,
            dropped_tool_calls: 0,
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn record_call(&mut self, call: ToolCall) {
        self.tool_calls.push(call);
    }

    pub fn is_finished(&self) -> bool {
        self.status != ExecutionStatus::Running
    }

    /// Finalize as completed. Ignored if already finalized.
    pub fn complete(&mut self, output: impl Into<String>) {
        if self.refuse_refinalize("complete") {
            return;
        }
        self.status = ExecutionStatus::Completed;
        self.output = Some(output.into());
        self.end_time = Some(Utc::now());
    }

    /// Finalize as failed. Ignored if already finalized.
    pub fn fail(&mut self, error: impl Into<String>) {
        if self.refuse_refinalize("fail") {
            return;
        }
        self.status = ExecutionStatus::Failed;
        self.error = Some(error.into());
        self.end_time = Some(Utc::now());
    }

    fn refuse_refinalize(&self, attempt: &str) -> bool {
        if self.is_finished() {
            warn!(
                execution_id = %self.id,
                status = ?self.status,
                attempt,
                "Execution already finalized, ignoring"
            );
            return true;
        }
        false
    }

    /// Wall-clock duration, once finished.
    pub fn duration_ms(&self) -> Option<i64> {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds())
    }

    /// The prompt this run was started with.
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }

    /// The turns to send to the model: the system prompt, then every other
    /// transcript message folded into conversational roles.
    pub fn outbound(&self) -> Vec<ChatMessage> {
        self.system_prompt()
            .map(|prompt| ChatMessage::new(Role::System, prompt))
            .into_iter()
            .chain(
                self.messages
                    .iter()
                    .filter(|m| m.role != Role::System)
                    .map(ChatMessage::from_transcript),
            )
            .collect()
    }
}
