//! Current date and time, formatted for Brazilian Portuguese.

use async_trait::async_trait;
use agentloom_core::error::ToolError;
use agentloom_core::tool::{Tool, ToolParameter};
use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde_json::{Map, Value};

pub struct GetCurrentTimeTool;

/// Snapshot of `now` in local time.
fn describe(now: DateTime<Local>) -> Value {
    serde_json::json!({
        "timestamp": now.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true),
        "date": now.format("%d/%m/%Y").to_string(),
        "time": now.format("%H:%M:%S").to_string(),
        "timezone": now.format("UTC%:z").to_string(),
        "unixTimestamp": now.timestamp(),
    })
}

#[async_trait]
impl Tool for GetCurrentTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Retorna a data e hora atual"
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        Vec::new()
    }

    async fn execute(&self, _arguments: Map<String, Value>) -> Result<Value, ToolError> {
        Ok(describe(Local::now()))
    }
}
