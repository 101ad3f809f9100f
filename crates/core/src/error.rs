//! Error types for the AgentLoom domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; the top-level [`Error`]
//! is what ends a run.

use thiserror::Error;

/// The top-level error type for a run.
///
/// Tool failures never reach it: the orchestrator folds them into the
/// transcript as observations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Model backend errors ---
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// The consumer of a streaming run went away.
    #[error("Event consumer disconnected")]
    StreamClosed,
}

/// Result type alias using our Error.
pub type Result<T, E = Error> = std::result::Result<T, E>;

// --- Bounded context errors ---

/// Failures talking to the language-model backend.
///
/// None of these are recovered inside a run: they abort it as failed.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("Model backend unavailable: {message} (status: {status})")]
    Unavailable { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Invalid response from model backend: {0}")]
    InvalidResponse(String),

    #[error("Not supported: {0}")]
    NotSupported(String),
}

/// Failures at the tool-invocation boundary.
///
/// The orchestrator folds these into the transcript as observations.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool '{tool_name}' is not available to agent '{agent_id}'")]
    NotPermitted { tool_name: String, agent_id: String },

    #[error("Tool '{tool_name}' execution failed: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// Failures reading agent definitions.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Failed to parse agent definitions: {0}")]
    Parse(String),
}
