//! Append-only event log kept as a JSON array on disk.
//!
//! The file holds at most `max_entries` entries; older ones are dropped.
//! Filesystem failures are reported to the model as `{success: false}`
//! rather than failing the call.

use async_trait::async_trait;
use agentloom_core::error::ToolError;
use agentloom_core::tool::{ParamType, Tool, ToolParameter};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::required_str;

pub struct SaveLogTool {
    path: PathBuf,
    max_entries: usize,
    /// Serializes read-modify-write cycles across concurrent runs.
    write_lock: Mutex<()>,
}

impl SaveLogTool {
    /// Log into `<data_dir>/logs.json`.
    pub fn new(data_dir: impl AsRef<Path>, max_entries: usize) -> Self {
        Self {
            path: data_dir.as_ref().join("logs.json"),
            max_entries: max_entries.max(1),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, entry: Value) -> std::io::Result<usize> {
        let _guard = self.write_lock.lock().await;

        let mut logs: Vec<Value> = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "Log file unreadable, starting fresh");
                Vec::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e),
        };

        logs.push(entry);
        if logs.len() > self.max_entries {
            let excess = logs.len() - self.max_entries;
            logs.drain(..excess);
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_string_pretty(&logs).map_err(std::io::Error::other)?;
        tokio::fs::write(&self.path, body).await?;

        Ok(logs.len() - 1)
    }
}

#[async_trait]
impl Tool for SaveLogTool {
    fn name(&self) -> &str {
        "save_log"
    }

    fn description(&self) -> &str {
        "Salva um log de evento ou ação realizada pelo agente"
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![
            ToolParameter::required("level", ParamType::String, "Nível do log: info, warning, error"),
            ToolParameter::required("message", ParamType::String, "Mensagem do log"),
            ToolParameter::optional("metadata", ParamType::Object, "Dados adicionais do log"),
        ]
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let level = required_str(&arguments, "level")?;
        let message = required_str(&arguments, "message")?;
        let metadata = arguments
            .get("metadata")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let entry = serde_json::json!({
            "timestamp": timestamp,
            "level": level,
            "message": message,
            "metadata": metadata,
        });

        match self.append(entry).await {
            Ok(log_id) => {
                debug!(log_id, level, "Saved log entry");
                Ok(serde_json::json!({
                    "success": true,
                    "logId": log_id,
                    "timestamp": timestamp,
                }))
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to save log entry");
                Ok(serde_json::json!({
                    "success": false,
                    "error": e.to_string(),
                }))
            }
        }
    }
}
