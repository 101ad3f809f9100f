//! Event sinks: where a run's progress events go.
//!
//! Blocking runs use [`NoopSink`]; streaming runs push into a bounded
//! channel through [`ChannelSink`].

use agentloom_core::{Error, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::stream_event::StreamEvent;

#[async_trait]
pub trait EventSink: Send {
    /// Whether events are observed at all. When `false` the orchestrator
    /// skips building event payloads and asks the model for whole replies
    /// instead of token streams.
    fn is_live(&self) -> bool {
        true
    }

    /// Deliver one event. An error means the consumer is gone and the run
    /// should stop.
    async fn emit(&mut self, event: StreamEvent) -> Result<()>;
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

#[async_trait]
impl EventSink for NoopSink {
    fn is_live(&self) -> bool {
        false
    }

    async fn emit(&mut self, _event: StreamEvent) -> Result<()> {
        Ok(())
    }
}

/// Forwards events into an mpsc channel, waiting for room.
pub struct ChannelSink {
    tx: mpsc::Sender<StreamEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<StreamEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn emit(&mut self, event: StreamEvent) -> Result<()> {
        self.tx.send(event).await.map_err(|_| Error::StreamClosed)
    }
}
