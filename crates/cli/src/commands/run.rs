//! `agentloom run`: run one agent against one input.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use agentloom_agent::{Orchestrator, StreamEvent};
use agentloom_config::AppConfig;
use agentloom_core::agent::Agent;
use agentloom_core::execution::ExecutionStatus;
use agentloom_core::store::{AgentStore, InMemoryAgentStore};
use agentloom_providers::OllamaClient;
use tracing::{info, warn};

pub struct RunArgs {
    pub agents: PathBuf,
    pub agent: String,
    pub input: String,
    pub stream: bool,
    pub json: bool,
}

pub async fn run(config: AppConfig, args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let agent = load_agent(&args.agents, &args.agent).await?;

    let client = Arc::new(OllamaClient::from_config(&config.ollama)?);
    let tools = Arc::new(agentloom_tools::default_registry(&config));
    let orchestrator = Orchestrator::from_config(&config, client, tools);

    if args.stream {
        return stream(&orchestrator, agent, args.input, args.json).await;
    }

    let execution = orchestrator.run(&agent, &args.input).await;
    info!(
        execution_id = %execution.id,
        status = ?execution.status,
        tool_calls = execution.tool_calls.len(),
        "Run finished"
    );
    if args.json {
        println!("{}", serde_json::to_string_pretty(&execution)?);
    } else if let Some(output) = &execution.output {
        println!("{output}");
    }

    match execution.status {
        ExecutionStatus::Failed => Err(execution
            .error
            .unwrap_or_else(|| "Execution failed".into())
            .into()),
        _ => Ok(()),
    }
}

/// Read the agents file and pick out an active agent by id.
async fn load_agent(path: &Path, id: &str) -> Result<Agent, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let store = InMemoryAgentStore::from_json(&raw)?;
    let agent = store
        .get_agent(id)
        .await?
        .ok_or_else(|| format!("Agent not found: {id}"))?;
    if !agent.is_active() {
        warn!(agent_id = %agent.id, "Refusing to run inactive agent");
        return Err(format!("Agent '{}' is inactive", agent.id).into());
    }

    info!(
        agent_id = %agent.id,
        agents_file = %path.display(),
        tools = agent.tools.len(),
        "Loaded agent"
    );
    Ok(agent)
}

async fn stream(
    orchestrator: &Orchestrator,
    agent: Agent,
    input: String,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut events = orchestrator.run_stream(agent, input);
    let mut failure = None;

    while let Some(event) = events.recv().await {
        if let StreamEvent::Error { error } = &event {
            failure = Some(error.clone());
        }
        let mut out = std::io::stdout().lock();
        let mut err = std::io::stderr().lock();
        render(&event, json, &mut out, &mut err)?;
        out.flush()?;
    }

    match failure {
        Some(error) => {
            warn!(error = %error, "Streaming run failed");
            Err(error.into())
        }
        None => Ok(()),
    }
}

/// Write one event: answer text to `out`, tool activity to `err`. In JSON
/// mode every event is one line on `out`.
fn render(
    event: &StreamEvent,
    json: bool,
    out: &mut impl Write,
    err: &mut impl Write,
) -> std::io::Result<()> {
    if json {
        let line = serde_json::to_string(event).map_err(std::io::Error::other)?;
        return writeln!(out, "{line}");
    }

    match event {
        StreamEvent::Token { chunk } => write!(out, "{chunk}"),
        StreamEvent::ToolCalls { tool_calls } => {
            writeln!(out)?;
            for call in tool_calls {
                writeln!(err, "  → {}({})", call.name, serde_json::Value::Object(call.arguments.clone()))?;
            }
            Ok(())
        }
        StreamEvent::ToolResult { tool_call, .. } => writeln!(err, "  ✅ {tool_call}"),
        StreamEvent::ToolError { tool_call, error } => writeln!(err, "  ❌ {tool_call}: {error}"),
        StreamEvent::Complete { .. } => writeln!(out),
        StreamEvent::Error { error } => writeln!(err, "  ❌ {error}"),
        StreamEvent::Start { .. } | StreamEvent::Thinking { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rendered(event: StreamEvent, json: bool) -> (String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        render(&event, json, &mut out, &mut err).unwrap();
        (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
    }

    const AGENTS: &str = r#"[
        {"id": "seller", "name": "Vendedor", "systemPrompt": "Você vende.", "tools": ["search_products"]},
        {"id": "idle", "name": "Parado", "systemPrompt": "p", "status": "inactive"}
    ]"#;

    #[tokio::test]
    async fn load_agent_picks_active_agent_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agents.json");
        std::fs::write(&path, AGENTS).unwrap();

        let agent = load_agent(&path, "seller").await.unwrap();
        assert_eq!(agent.name, "Vendedor");
        assert_eq!(agent.tools, vec!["search_products"]);
    }

    #[tokio::test]
    async fn load_agent_refuses_inactive_and_unknown_agents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agents.json");
        std::fs::write(&path, AGENTS).unwrap();

        let err = load_agent(&path, "idle").await.unwrap_err();
        assert_eq!(err.to_string(), "Agent 'idle' is inactive");

        let err = load_agent(&path, "ghost").await.unwrap_err();
        assert_eq!(err.to_string(), "Agent not found: ghost");

        let err = load_agent(&dir.path().join("missing.json"), "seller").await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
    }

    #[test]
    fn tokens_go_to_stdout_unchanged() {
        let (out, err) = rendered(StreamEvent::Token { chunk: "Sim, ".into() }, false);
        assert_eq!(out, "Sim, ");
        assert!(err.is_empty());
    }

    #[test]
    fn tool_activity_goes_to_stderr() {
        let (out, err) = rendered(
            StreamEvent::ToolError {
                tool_call: "check_stock".into(),
                error: "boom".into(),
            },
            false,
        );
        assert!(out.is_empty());
        assert!(err.contains("check_stock: boom"));
    }

    #[test]
    fn json_mode_prints_one_line_per_event() {
        let (out, err) = rendered(
            StreamEvent::ToolResult {
                tool_call: "search_products".into(),
                result: json!({"totalResults": 2}),
            },
            true,
        );
        assert!(err.is_empty());
        assert_eq!(out.lines().count(), 1);
        let value: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(value["type"], "tool_result");
        assert_eq!(value["data"]["toolCall"], "search_products");
    }

    #[test]
    fn lifecycle_events_are_silent_in_text_mode() {
        let (out, err) = rendered(StreamEvent::Thinking { iteration: 1 }, false);
        assert!(out.is_empty() && err.is_empty());
    }
}
