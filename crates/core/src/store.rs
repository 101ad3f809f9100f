//! AgentStore trait: read access to agent definitions.
//!
//! The orchestrator only ever reads agents; persistence belongs to whoever
//! implements this trait.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::agent::Agent;
use crate::error::StoreError;

#[async_trait]
pub trait AgentStore: Send + Sync {
    /// Look up one agent by id.
    async fn get_agent(&self, id: &str) -> Result<Option<Agent>, StoreError>;

    /// All agents, in insertion order.
    async fn list_agents(&self) -> Result<Vec<Agent>, StoreError>;
}

#[derive(Default)]
struct Inner {
    order: Vec<String>,
    agents: HashMap<String, Agent>,
}

/// An in-memory store, optionally seeded from JSON.
#[derive(Default)]
pub struct InMemoryAgentStore {
    inner: RwLock<Inner>,
}

impl InMemoryAgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse either a single agent object or an array of agents.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| StoreError::Parse(e.to_string()))?;
        let agents: Vec<Agent> = if value.is_array() {
            serde_json::from_value(value)
        } else {
            serde_json::from_value(value).map(|a| vec![a])
        }
        .map_err(|e| StoreError::Parse(e.to_string()))?;

        let mut inner = Inner::default();
        for agent in agents {
            insert_into(&mut inner, agent);
        }
        Ok(Self {
            inner: RwLock::new(inner),
        })
    }

    /// Insert or replace an agent by id.
    pub async fn insert(&self, agent: Agent) {
        let mut inner = self.inner.write().await;
        insert_into(&mut inner, agent);
    }
}

fn insert_into(inner: &mut Inner, agent: Agent) {
    if !inner.agents.contains_key(&agent.id) {
        inner.order.push(agent.id.clone());
    }
    inner.agents.insert(agent.id.clone(), agent);
}

#[async_trait]
impl AgentStore for InMemoryAgentStore {
    async fn get_agent(&self, id: &str) -> Result<Option<Agent>, StoreError> {
        Ok(self.inner.read().await.agents.get(id).cloned())
    }

    async fn list_agents(&self) -> Result<Vec<Agent>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.agents.get(id).cloned())
            .collect())
    }
}
