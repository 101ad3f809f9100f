//! # AgentLoom Core
//!
//! Domain types, traits, and error definitions for the AgentLoom agent runtime.
//! This crate has **no framework dependencies**: it defines the domain model
//! that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Each collaborator of the orchestrator (model backend, tool, agent storage)
//! is a trait here. Implementations live in their respective crates, which
//! keeps the loop testable with scripted stand-ins and lets the composition
//! root decide what gets wired together.

pub mod agent;
pub mod error;
pub mod execution;
pub mod message;
pub mod model;
pub mod store;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{Agent, AgentStatus};
pub use error::{Error, ModelError, Result, StoreError, ToolError};
pub use execution::{Execution, ExecutionStatus};
pub use message::{ChatMessage, Message, Role};
pub use model::{ChatOptions, ChatRequest, FragmentReceiver, ModelClient};
pub use store::{AgentStore, InMemoryAgentStore};
pub use tool::{
    FunctionSchema, ParamType, Tool, ToolCall, ToolParameter, ToolRegistry, ToolSchema,
};
