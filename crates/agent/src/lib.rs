//! The agent execution loop for AgentLoom.
//!
//! An [`Orchestrator`] takes an agent definition and a user input, then
//! cycles **call model → extract tool calls → execute → observe** until the
//! model answers in plain text or the iteration bound is reached.
//!
//! Runs are either blocking ([`Orchestrator::run`]) or streamed as
//! [`StreamEvent`]s ([`Orchestrator::run_stream`]).

pub mod extractor;
pub mod orchestrator;
pub mod prompt;
pub mod sink;
pub mod stream_event;

#[cfg(test)]
mod test_helpers;

pub use extractor::{Extraction, MarkerExtractor, ToolCallExtractor};
pub use orchestrator::{MAX_ITERATIONS_OUTPUT, Orchestrator};
pub use prompt::SystemPrompt;
pub use sink::{ChannelSink, EventSink, NoopSink};
pub use stream_event::StreamEvent;
