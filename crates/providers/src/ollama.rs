//! Ollama model client.
//!
//! Talks to the native Ollama HTTP API:
//! - `POST /api/chat` (complete reply, or newline-delimited JSON stream)
//! - `POST /api/embeddings`
//! - `GET /api/tags` (model listing and health checks)

use agentloom_config::OllamaConfig;
use agentloom_core::error::ModelError;
use agentloom_core::model::{ChatRequest, FragmentReceiver, ModelClient};
use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// A client for a local or remote Ollama server.
pub struct OllamaClient {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a client for `base_url`. Every call is bounded by `timeout`;
    /// streamed replies apply it to each read.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ModelError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    pub fn from_config(config: &OllamaConfig) -> Result<Self, ModelError> {
        Self::new(&config.base_url, Duration::from_millis(config.timeout_ms))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn chat_body(request: &ChatRequest, stream: bool) -> serde_json::Value {
        serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "stream": stream,
            "options": {
                "temperature": request.options.temperature,
                "num_predict": request.options.num_predict,
                "num_ctx": request.options.num_ctx,
            },
        })
    }

    fn no_response(&self) -> ModelError {
        ModelError::Timeout(format!("no response within {}ms", self.timeout.as_millis()))
    }

    /// Map a transport failure.
    fn transport_error(&self, e: reqwest::Error) -> ModelError {
        if e.is_timeout() {
            self.no_response()
        } else {
            ModelError::Network(e.to_string())
        }
    }

    /// Turn a non-success response into `Unavailable`, keeping the status
    /// text and whatever body the server sent.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ModelError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let reason = status.canonical_reason().unwrap_or("Unknown status");
        warn!(status = status.as_u16(), body = %body, "Ollama returned error");
        let message = if body.trim().is_empty() {
            reason.to_string()
        } else {
            format!("{reason}: {}", body.trim())
        };
        Err(ModelError::Unavailable {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ModelError> {
        let url = format!("{}/api/chat", self.base_url);
        debug!(model = %request.model, turns = request.messages.len(), "Sending chat request");

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&Self::chat_body(&request, false))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let response = Self::check_status(response).await?;

        let reply: ChatChunk = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else {
                ModelError::InvalidResponse(format!("Failed to parse chat response: {e}"))
            }
        })?;

        if let Some(error) = reply.error {
            return Err(ModelError::InvalidResponse(error));
        }
        reply
            .message
            .map(|m| m.content)
            .ok_or_else(|| ModelError::InvalidResponse("No message in chat response".into()))
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<FragmentReceiver, ModelError> {
        let url = format!("{}/api/chat", self.base_url);
        debug!(model = %request.model, turns = request.messages.len(), "Sending streaming chat request");

        let send = self
            .client
            .post(&url)
            .json(&Self::chat_body(&request, true))
            .send();
        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| self.no_response())?
            .map_err(|e| self.transport_error(e))?;
        // No request-level timeout here, so an error body must be bounded too.
        let response = tokio::time::timeout(self.timeout, Self::check_status(response))
            .await
            .map_err(|_| self.no_response())??;

        // One in-flight fragment: a consumer that stops pulling stops the reads.
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        let read_timeout = self.timeout;

        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut decoder = NdjsonDecoder::new();

            loop {
                let next = match tokio::time::timeout(read_timeout, byte_stream.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        let _ = tx
                            .send(Err(ModelError::Timeout(format!(
                                "stream stalled for {}ms",
                                read_timeout.as_millis()
                            ))))
                            .await;
                        return;
                    }
                };

                let (decoded, exhausted) = match next {
                    Some(Ok(bytes)) => (decoder.push(&bytes), false),
                    Some(Err(e)) => {
                        let _ = tx
                            .send(Err(ModelError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                    None => (decoder.finish(), true),
                };

                match decoded {
                    Ok(fragments) => {
                        for fragment in fragments {
                            if tx.send(Ok(fragment)).await.is_err() {
                                trace!("Fragment receiver dropped, stopping stream");
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                }

                if exhausted || decoder.is_done() {
                    return;
                }
            }
        });

        Ok(rx)
    }

    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>, ModelError> {
        let url = format!("{}/api/embeddings", self.base_url);
        debug!(model = %model, chars = text.len(), "Sending embedding request");

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(&serde_json::json!({ "model": model, "prompt": text }))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let response = Self::check_status(response).await?;

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            ModelError::InvalidResponse(format!("Failed to parse embedding response: {e}"))
        })?;
        Ok(body.embedding)
    }

    async fn list_models(&self) -> Result<Vec<String>, ModelError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let response = Self::check_status(response).await?;

        let body: TagsResponse = response.json().await.map_err(|e| {
            ModelError::InvalidResponse(format!("Failed to parse model list: {e}"))
        })?;
        Ok(body.models.into_iter().map(|m| m.name).collect())
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).timeout(self.timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Ollama health check failed");
                false
            }
        }
    }
}

/// Incremental decoder for Ollama's newline-delimited chat stream.
///
/// Bytes are buffered until a full line is available, so JSON objects (and
/// multi-byte characters) split across transport chunks decode intact.
/// Malformed lines are skipped; nothing is produced after a `done` fragment.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl NdjsonDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a `done` fragment has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed transport bytes; returns the text fragments of every complete
    /// line. An `error` line from the server ends the stream as an error.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, ModelError> {
        let mut fragments = Vec::new();
        if self.done {
            return Ok(fragments);
        }
        self.buffer.extend_from_slice(bytes);

        while let Some(line_end) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=line_end).collect();
            self.decode_line(&line[..line.len() - 1], &mut fragments)?;
            if self.done {
                self.buffer.clear();
                break;
            }
        }
        Ok(fragments)
    }

    /// Flush a trailing line that arrived without a newline.
    pub fn finish(&mut self) -> Result<Vec<String>, ModelError> {
        let mut fragments = Vec::new();
        if !self.done && !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.decode_line(&line, &mut fragments)?;
        }
        Ok(fragments)
    }

    fn decode_line(&mut self, line: &[u8], out: &mut Vec<String>) -> Result<(), ModelError> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return Ok(());
        }

        let chunk: ChatChunk = match serde_json::from_slice(line) {
            Ok(chunk) => chunk,
            Err(e) => {
                trace!(
                    line = %String::from_utf8_lossy(line),
                    error = %e,
                    "Ignoring unparseable stream line"
                );
                return Ok(());
            }
        };

        if let Some(error) = chunk.error {
            return Err(ModelError::StreamInterrupted(error));
        }
        if let Some(message) = chunk.message
            && !message.content.is_empty()
        {
            out.push(message.content);
        }
        if chunk.done {
            self.done = true;
        }
        Ok(())
    }
}

// --- Ollama API types (internal) ---

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}
