//! Model client implementations for AgentLoom.
//!
//! All clients implement the `agentloom_core::ModelClient` trait.

pub mod ollama;

pub use ollama::{NdjsonDecoder, OllamaClient};
