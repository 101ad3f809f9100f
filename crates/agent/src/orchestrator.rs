//! The agent execution loop.
//!
//! One driver serves both entry points: a blocking run hands it a
//! [`NoopSink`], a streaming run a [`ChannelSink`].

use std::sync::Arc;
use std::time::Instant;

use agentloom_config::AppConfig;
use agentloom_core::agent::Agent;
use agentloom_core::error::ToolError;
use agentloom_core::execution::Execution;
use agentloom_core::message::Message;
use agentloom_core::model::{ChatOptions, ChatRequest, ModelClient};
use agentloom_core::tool::{ToolCall, ToolRegistry};
use agentloom_core::Result;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::extractor::{Extraction, MarkerExtractor, ToolCallExtractor};
use crate::prompt::SystemPrompt;
use crate::sink::{ChannelSink, EventSink, NoopSink};
use crate::stream_event::StreamEvent;

/// Output of a run that used up its iteration budget.
pub const MAX_ITERATIONS_OUTPUT: &str = "Maximum iterations reached";

pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

pub const DEFAULT_LANGUAGE: &str = "Brazilian Portuguese (pt-BR)";

/// Runs agents against a model client and a tool registry.
///
/// Cheap to clone; concurrent runs share the client and the registry.
#[derive(Clone)]
pub struct Orchestrator {
    client: Arc<dyn ModelClient>,
    tools: Arc<ToolRegistry>,
    model: String,
    options: ChatOptions,
    max_iterations: u32,
    language: String,
    extractor: Arc<dyn ToolCallExtractor>,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn ModelClient>,
        tools: Arc<ToolRegistry>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            tools,
            model: model.into(),
            options: ChatOptions::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            language: DEFAULT_LANGUAGE.into(),
            extractor: Arc::new(MarkerExtractor),
        }
    }

    /// Model, sampling options, iteration bound and language from config.
    pub fn from_config(
        config: &AppConfig,
        client: Arc<dyn ModelClient>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self::new(client, tools, &config.ollama.model)
            .with_options(ChatOptions {
                temperature: config.ollama.temperature,
                num_predict: config.ollama.max_tokens,
                num_ctx: config.ollama.context_window,
            })
            .with_max_iterations(config.agent.max_iterations)
            .with_language(&config.agent.response_language)
    }

    /// Set the maximum number of model round-trips per run (at least 1).
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn ToolCallExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Set the language every answer must be written in.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// The system prompt a run of `agent` would use.
    pub fn system_prompt(&self, agent: &Agent) -> String {
        SystemPrompt::new(&self.language, &self.tools, self.extractor.as_ref()).build(agent)
    }

    /// Run to completion and return the finalized execution.
    ///
    /// Never returns an error: failures are recorded on the execution.
    pub async fn run(&self, agent: &Agent, input: &str) -> Execution {
        self.drive(agent, input, &mut NoopSink).await
    }

    /// Run in the background, streaming progress events.
    ///
    /// The sequence always ends with exactly one `complete` or `error`
    /// event. Dropping the receiver stops the run at its next event.
    pub fn run_stream(&self, agent: Agent, input: impl Into<String>) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(1);
        let this = self.clone();
        let input = input.into();

        tokio::spawn(async move {
            let mut sink = ChannelSink::new(tx);
            this.drive(&agent, &input, &mut sink).await;
        });

        rx
    }

    /// Run with a caller-supplied sink.
    pub async fn run_with_sink(
        &self,
        agent: &Agent,
        input: &str,
        sink: &mut dyn EventSink,
    ) -> Execution {
        self.drive(agent, input, sink).await
    }

    async fn drive(&self, agent: &Agent, input: &str, sink: &mut dyn EventSink) -> Execution {
        let mut execution = Execution::start(&agent.id, self.system_prompt(agent), input);
        info!(
            execution_id = %execution.id,
            agent_id = %agent.id,
            streaming = sink.is_live(),
            "Starting execution"
        );

        match self.iterate(agent, &mut execution, sink).await {
            Ok(output) => {
                execution.complete(output.clone());
                info!(
                    execution_id = %execution.id,
                    tool_calls = execution.tool_calls.len(),
                    duration_ms = execution.duration_ms().unwrap_or_default(),
                    "Execution completed"
                );
                let finished = &execution;
                if let Err(e) = notify(sink, || StreamEvent::Complete {
                    output,
                    execution: Box::new(finished.clone()),
                })
                .await
                {
                    debug!(execution_id = %execution.id, error = %e, "Completion event not delivered");
                }
            }
            Err(e) => {
                let error = e.to_string();
                warn!(execution_id = %execution.id, error = %error, "Execution failed");
                execution.fail(error.clone());
                let _ = notify(sink, || StreamEvent::Error { error }).await;
            }
        }

        execution
    }

    /// The iterate-call-observe loop. `Err` means the run failed; tool
    /// failures never surface here.
    async fn iterate(
        &self,
        agent: &Agent,
        execution: &mut Execution,
        sink: &mut dyn EventSink,
    ) -> Result<String> {
        let execution_id = execution.id.clone();
        notify(sink, || StreamEvent::Start {
            execution_id: execution_id.clone(),
        })
        .await?;

        for iteration in 1..=self.max_iterations {
            debug!(execution_id = %execution_id, iteration, "Agent loop iteration");
            notify(sink, || StreamEvent::Thinking { iteration }).await?;

            let request = ChatRequest::new(&self.model, execution.outbound())
                .with_options(self.options);
            let reply = if sink.is_live() {
                self.stream_reply(request, sink).await?
            } else {
                self.client.chat(request).await?
            };

            let Extraction {
                text,
                calls,
                dropped,
            } = self.extractor.extract(&reply);
            if dropped > 0 {
                execution.dropped_tool_calls += dropped;
                warn!(execution_id = %execution_id, iteration, dropped, "Dropped malformed tool calls");
            }

            if calls.is_empty() {
                execution.push(Message::assistant(text.clone()));
                return Ok(text);
            }

            execution.push(Message::assistant_with_calls(text, calls.clone()));
            notify(sink, || StreamEvent::ToolCalls {
                tool_calls: calls.clone(),
            })
            .await?;

            // Sequential, in textual order.
            for mut call in calls {
                let started = Instant::now();
                let outcome = self.invoke(agent, &call).await;
                let duration_ms = started.elapsed().as_millis() as u64;

                let event = match outcome {
                    Ok(result) => {
                        debug!(tool = %call.name, duration_ms, "Tool succeeded");
                        execution.push(Message::tool_result(&call.id, result.to_string()));
                        call.result = Some(result.clone());
                        StreamEvent::ToolResult {
                            tool_call: call.name.clone(),
                            result,
                        }
                    }
                    Err(e) => {
                        let reason = e.to_string();
                        warn!(tool = %call.name, duration_ms, error = %reason, "Tool call failed");
                        execution.push(Message::tool_result(&call.id, format!("Error: {reason}")));
                        call.error = Some(reason.clone());
                        StreamEvent::ToolError {
                            tool_call: call.name.clone(),
                            error: reason,
                        }
                    }
                };
                execution.record_call(call);
                notify(sink, || event).await?;
            }
        }

        warn!(
            execution_id = %execution_id,
            max_iterations = self.max_iterations,
            "Max iterations reached"
        );
        Ok(MAX_ITERATIONS_OUTPUT.to_string())
    }

    /// Stream one reply, forwarding each fragment as a `token` event.
    async fn stream_reply(
        &self,
        request: ChatRequest,
        sink: &mut dyn EventSink,
    ) -> Result<String> {
        let mut fragments = self.client.chat_stream(request).await?;
        let mut reply = String::new();
        while let Some(fragment) = fragments.recv().await {
            let chunk = fragment?;
            reply.push_str(&chunk);
            sink.emit(StreamEvent::Token { chunk }).await?;
        }
        Ok(reply)
    }

    /// Execute one call, enforcing the agent's tool allowlist.
    async fn invoke(&self, agent: &Agent, call: &ToolCall) -> Result<Value, ToolError> {
        if self.tools.get(&call.name).is_none() {
            return Err(ToolError::NotFound(call.name.clone()));
        }
        if !agent.allows_tool(&call.name) {
            return Err(ToolError::NotPermitted {
                tool_name: call.name.clone(),
                agent_id: agent.id.clone(),
            });
        }
        self.tools.execute(&call.name, call.arguments.clone()).await
    }
}

/// Emit an event if anyone is listening; the payload is only built then.
async fn notify<F>(sink: &mut dyn EventSink, event: F) -> Result<()>
where
    F: FnOnce() -> StreamEvent + Send,
{
    if sink.is_live() {
        sink.emit(event()).await
    } else {
        Ok(())
    }
}
