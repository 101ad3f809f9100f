//! Built-in tool implementations for AgentLoom.
//!
//! A small demo storefront: search a product catalog, check stock, keep
//! an event log, send (simulated) messages, and tell the time. Enough for
//! an agent to hold a realistic sales conversation end to end.

pub mod check_stock;
pub mod get_current_time;
pub mod save_log;
pub mod search_products;
pub mod send_message;

use agentloom_config::AppConfig;
use agentloom_core::error::ToolError;
use agentloom_core::tool::ToolRegistry;
use serde_json::{Map, Value};

pub use check_stock::CheckStockTool;
pub use get_current_time::GetCurrentTimeTool;
pub use save_log::SaveLogTool;
pub use search_products::SearchProductsTool;
pub use send_message::SendMessageTool;

/// Create a tool registry with all built-in tools.
///
/// `save_log` writes under `config.data.path`.
pub fn default_registry(config: &AppConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(SearchProductsTool));
    registry.register(Box::new(CheckStockTool));
    registry.register(Box::new(SaveLogTool::new(
        &config.data.path,
        config.data.max_log_entries,
    )));
    registry.register(Box::new(SendMessageTool::new()));
    registry.register(Box::new(GetCurrentTimeTool));
    registry
}

/// Fetch a required string argument.
pub(crate) fn required_str<'a>(
    arguments: &'a Map<String, Value>,
    name: &str,
) -> Result<&'a str, ToolError> {
    arguments
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{name}' argument")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_all_tools_in_order() {
        let registry = default_registry(&AppConfig::default());
        assert_eq!(
            registry.names(),
            vec![
                "search_products",
                "check_stock",
                "save_log",
                "send_message",
                "get_current_time"
            ]
        );
    }

    #[test]
    fn every_tool_renders_a_schema() {
        let registry = default_registry(&AppConfig::default());
        for schema in registry.call_schemas(None) {
            assert_eq!(schema.kind, "function");
            assert!(!schema.function.description.is_empty());
            assert_eq!(schema.function.parameters["type"], "object");
        }
    }

    #[tokio::test]
    async fn registry_wraps_invalid_arguments() {
        let registry = default_registry(&AppConfig::default());
        let err = registry
            .execute("check_stock", Map::new())
            .await
            .unwrap_err();
        match err {
            ToolError::ExecutionFailed { tool_name, reason } => {
                assert_eq!(tool_name, "check_stock");
                assert!(reason.contains("productId"));
            }
            other => panic!("Expected ExecutionFailed, got {other:?}"),
        }
    }
}
