//! ModelClient trait: the abstraction over chat-completion backends.
//!
//! A client knows how to send a conversation to a model and get the reply
//! back, either whole or as a stream of text fragments.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ModelError;
use crate::message::ChatMessage;

/// Receiving half of a streamed reply. Each item is one incremental text
/// fragment; an `Err` item ends the stream.
pub type FragmentReceiver = mpsc::Receiver<Result<String, ModelError>>;

/// Sampling options forwarded with every chat request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    /// Temperature (0.0 = deterministic, 1.0 = creative)
    pub temperature: f32,

    /// Maximum tokens to generate
    pub num_predict: u32,

    /// Context window size
    pub num_ctx: u32,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            num_predict: 1024,
            num_ctx: 2048,
        }
    }
}

/// One chat-completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The model to use (e.g., "phi3")
    pub model: String,

    /// The conversation turns, system prompt first
    pub messages: Vec<ChatMessage>,

    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: ChatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }
}

/// The core ModelClient trait.
///
/// Implementations hold no per-call mutable state and are shared across
/// concurrent runs as `Arc<dyn ModelClient>`.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Backend name, for logging.
    fn name(&self) -> &str;

    /// Send a conversation and wait for the complete reply.
    async fn chat(&self, request: ChatRequest) -> Result<String, ModelError>;

    /// Send a conversation and receive the reply as text fragments.
    ///
    /// The default delivers the blocking reply as a single fragment.
    async fn chat_stream(&self, request: ChatRequest) -> Result<FragmentReceiver, ModelError> {
        let reply = self.chat(request).await?;
        let (tx, rx) = mpsc::channel(1);
        // Capacity 1 and an empty channel: try_send cannot fail here.
        let _ = tx.try_send(Ok(reply));
        Ok(rx)
    }

    /// Produce an embedding vector for `text`.
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>, ModelError> {
        let _ = (model, text);
        Err(ModelError::NotSupported(format!(
            "{} does not produce embeddings",
            self.name()
        )))
    }

    /// Names of the models installed on the backend.
    async fn list_models(&self) -> Result<Vec<String>, ModelError> {
        Ok(Vec::new())
    }

    /// Best-effort reachability check. Never fails.
    async fn health_check(&self) -> bool {
        true
    }
}
