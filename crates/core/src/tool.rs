//! Tool trait: the abstraction over agent capabilities.
//!
//! Tools are what let a model act mid-conversation: search a catalog,
//! check stock, send a message. Each tool declares an ordered list of typed
//! parameters; the registry renders those declarations both as prompt text
//! and as function-calling schemas.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::ToolError;

/// A request from the model to invoke a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    /// Unique call ID
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments by parameter name
    #[serde(default)]
    pub arguments: Map<String, Value>,

    /// Result, attached after a successful execution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Failure reason, attached after a failed execution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolCall {
    /// Create a call with a freshly generated id.
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            arguments,
            result: None,
            error: None,
        }
    }
}

/// Primitive type tag of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
            ParamType::Array => "array",
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,

    #[serde(rename = "type")]
    pub param_type: ParamType,

    pub description: String,

    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ToolParameter {
    pub fn required(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: true,
            default: None,
        }
    }

    pub fn optional(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// A function-calling schema for backends with native tool support.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    /// JSON Schema object describing the parameters
    pub parameters: Value,
}

/// The core Tool trait.
///
/// Tools are registered once in the [`ToolRegistry`] at startup and shared
/// read-only by every run.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "search_products").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// Declared parameters, in display order.
    fn parameters(&self) -> Vec<ToolParameter>;

    /// Execute the tool with the raw argument map.
    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value, ToolError>;

    /// Render this tool as a function-calling schema.
    fn to_schema(&self) -> ToolSchema {
        let params = self.parameters();
        let mut properties = Map::new();
        for p in &params {
            let mut prop = Map::new();
            prop.insert("type".into(), Value::String(p.param_type.as_str().into()));
            prop.insert("description".into(), Value::String(p.description.clone()));
            if let Some(default) = &p.default {
                prop.insert("default".into(), default.clone());
            }
            properties.insert(p.name.clone(), Value::Object(prop));
        }
        let required: Vec<Value> = params
            .iter()
            .filter(|p| p.required)
            .map(|p| Value::String(p.name.clone()))
            .collect();

        ToolSchema {
            kind: "function".into(),
            function: FunctionSchema {
                name: self.name().to_string(),
                description: self.description().to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": properties,
                    "required": required,
                }),
            },
        }
    }
}

/// A registry of available tools, ordered by first registration.
///
/// The orchestrator uses this to:
/// 1. Describe an agent's tools inside its system prompt
/// 2. Look up and execute tools when the model requests them
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name,
    /// keeping its original position.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        match self.index.get(&name) {
            Some(&slot) => {
                debug!(tool = %name, "Replacing registered tool");
                self.tools[slot] = tool;
            }
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&slot| self.tools[slot].as_ref())
    }

    /// All tools in registration order.
    pub fn all(&self) -> Vec<&dyn Tool> {
        self.tools.iter().map(|t| t.as_ref()).collect()
    }

    /// List all registered tool names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Resolve a name selection; `None` selects every tool. Unknown names
    /// are skipped.
    fn select(&self, names: Option<&[String]>) -> Vec<&dyn Tool> {
        match names {
            Some(names) => names.iter().filter_map(|n| self.get(n)).collect(),
            None => self.all(),
        }
    }

    /// Execute a tool by name.
    ///
    /// Any failure raised by the tool itself comes back as
    /// [`ToolError::ExecutionFailed`] naming the tool.
    pub async fn execute(&self, name: &str, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        debug!(tool = %name, "Executing tool");
        tool.execute(arguments).await.map_err(|e| match e {
            ToolError::ExecutionFailed { .. } => e,
            other => ToolError::ExecutionFailed {
                tool_name: name.to_string(),
                reason: other.to_string(),
            },
        })
    }

    /// Render the human-readable tool block embedded in system prompts.
    pub fn describe_for_prompt(&self, names: Option<&[String]>) -> String {
        self.select(names)
            .into_iter()
            .map(|tool| {
                let params = tool
                    .parameters()
                    .iter()
                    .map(|p| {
                        let marker = if p.required { "required" } else { "optional" };
                        format!(
                            "    - {}: {} ({}) - {}",
                            p.name, p.param_type, marker, p.description
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                let params = if params.is_empty() {
                    "    (none)".to_string()
                } else {
                    params
                };
                format!(
                    "### {}\n{}\n\nParameters:\n{}",
                    tool.name(),
                    tool.description(),
                    params
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Function-calling schemas for the selected tools.
    pub fn call_schemas(&self, names: Option<&[String]>) -> Vec<ToolSchema> {
        self.select(names).into_iter().map(|t| t.to_schema()).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool {
        description: &'static str,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            self.description
        }
        fn parameters(&self) -> Vec<ToolParameter> {
            vec![
                ToolParameter::required("text", ParamType::String, "Text to echo back"),
                ToolParameter::optional("times", ParamType::Number, "Repeat count").with_default(1),
            ]
        }
        async fn execute(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
            let text = arguments
                .get("text")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::InvalidArguments("missing 'text'".into()))?;
            Ok(serde_json::json!({ "echo": text }))
        }
    }

    struct ClockTool;

    #[async_trait]
    impl Tool for ClockTool {
        fn name(&self) -> &str {
            "clock"
        }
        fn description(&self) -> &str {
            "Tells the time"
        }
        fn parameters(&self) -> Vec<ToolParameter> {
            vec![]
        }
        async fn execute(&self, _arguments: Map<String, Value>) -> Result<Value, ToolError> {
            Ok(serde_json::json!({ "time": "12:00" }))
        }
    }

    fn echo() -> Box<dyn Tool> {
        Box::new(EchoTool {
            description: "Echoes back the input",
        })
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(echo());
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn registration_order_is_kept_and_last_registration_wins() {
        let mut registry = ToolRegistry::new();
        registry.register(echo());
        registry.register(Box::new(ClockTool));
        registry.register(Box::new(EchoTool {
            description: "Second echo",
        }));

        assert_eq!(registry.names(), vec!["echo", "clock"]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("echo").unwrap().description(), "Second echo");
    }

    #[tokio::test]
    async fn registry_execute_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(echo());

        let mut args = Map::new();
        args.insert("text".into(), Value::String("hello".into()));
        let result = registry.execute("echo", args).await.unwrap();
        assert_eq!(result["echo"], "hello");
    }

    #[tokio::test]
    async fn registry_execute_missing_tool() {
        let registry = ToolRegistry::new();
        let err = registry.execute("unknown_tool", Map::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
        assert!(err.to_string().contains("unknown_tool"));
    }

    #[tokio::test]
    async fn tool_failures_are_wrapped_with_tool_name() {
        let mut registry = ToolRegistry::new();
        registry.register(echo());

        let err = registry.execute("echo", Map::new()).await.unwrap_err();
        match err {
            ToolError::ExecutionFailed { tool_name, reason } => {
                assert_eq!(tool_name, "echo");
                assert!(reason.contains("missing 'text'"));
            }
            other => panic!("Expected ExecutionFailed, got {other:?}"),
        }
    }

    #[test]
    fn prompt_description_lists_parameters() {
        let mut registry = ToolRegistry::new();
        registry.register(echo());
        registry.register(Box::new(ClockTool));

        let text = registry.describe_for_prompt(None);
        assert!(text.starts_with("### echo\nEchoes back the input\n\nParameters:\n"));
        assert!(text.contains("    - text: string (required) - Text to echo back"));
        assert!(text.contains("    - times: number (optional) - Repeat count"));
        assert!(text.contains("### clock\nTells the time\n\nParameters:\n    (none)"));
    }

    #[test]
    fn prompt_description_respects_selection() {
        let mut registry = ToolRegistry::new();
        registry.register(echo());
        registry.register(Box::new(ClockTool));

        let selection = vec!["clock".to_string(), "missing".to_string()];
        let text = registry.describe_for_prompt(Some(&selection));
        assert!(text.contains("### clock"));
        assert!(!text.contains("### echo"));

        assert!(registry.describe_for_prompt(Some(&[])).is_empty());
    }

    #[test]
    fn call_schema_shape() {
        let mut registry = ToolRegistry::new();
        registry.register(echo());

        let schemas = registry.call_schemas(Some(&["echo".to_string()]));
        assert_eq!(schemas.len(), 1);

        let json = serde_json::to_value(&schemas[0]).unwrap();
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "echo");
        assert_eq!(json["function"]["parameters"]["type"], "object");
        assert_eq!(
            json["function"]["parameters"]["properties"]["text"]["type"],
            "string"
        );
        assert_eq!(
            json["function"]["parameters"]["properties"]["times"]["default"],
            1
        );
        assert_eq!(
            json["function"]["parameters"]["required"],
            serde_json::json!(["text"])
        );
    }

    #[test]
    fn new_calls_get_unique_ids() {
        let a = ToolCall::new("echo", Map::new());
        let b = ToolCall::new("echo", Map::new());
        assert_ne!(a.id, b.id);
        assert!(a.result.is_none() && a.error.is_none());
    }
}
