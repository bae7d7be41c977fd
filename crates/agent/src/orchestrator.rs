//! The orchestrator state machine.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vibeforge_core::error::ProviderError;
use vibeforge_core::message::{Conversation, Message};
use vibeforge_core::provider::{ModelStep, Provider, ProviderRequest};
use vibeforge_core::tool::{ToolBridge, ToolCall, ToolDescriptor};
use vibeforge_core::TraceEvent;

use crate::sink::TraceSink;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The model sent a final message.
    Final,
    /// The model endpoint answered with a non-success status.
    UpstreamError,
    /// The model endpoint could not be reached or decoded.
    Failed,
    /// The model answered with neither a message nor a tool call.
    Malformed,
    /// A tool call could not be completed.
    ToolFailed,
    /// `max_iterations` model calls without a final message.
    IterationLimit,
    /// The caller went away.
    Cancelled,
}

impl Termination {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Final => "final",
            Self::UpstreamError => "upstream_error",
            Self::Failed => "failed",
            Self::Malformed => "malformed",
            Self::ToolFailed => "tool_failed",
            Self::IterationLimit => "iteration_limit",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The summary of one run.
#[derive(Debug)]
pub struct RunOutcome {
    pub termination: Termination,

    /// Model calls made
    pub iterations: u32,

    /// Tool calls dispatched
    pub tool_calls: u32,

    /// The full conversation as it stood when the run ended
    pub conversation: Conversation,
}

enum LoopState {
    AwaitingModel,
    HandlingTool(ToolCall),
    Done(Termination),
}

/// Drives a conversation between the model and the tool bridge.
///
/// Cheap to clone; everything shared is behind an `Arc`.
#[derive(Clone)]
pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    bridge: Arc<dyn ToolBridge>,
    model: String,
    temperature: f32,
    tools: Arc<Vec<ToolDescriptor>>,
    system_prompt: String,
    continue_prompt: String,
    max_iterations: u32,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        bridge: Arc<dyn ToolBridge>,
        model: impl Into<String>,
        temperature: f32,
        tools: Arc<Vec<ToolDescriptor>>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            bridge,
            model: model.into(),
            temperature,
            tools,
            system_prompt: system_prompt.into(),
            continue_prompt: "Continue.".into(),
            max_iterations: 25,
        }
    }

    /// Build from configuration, advertising the full tool catalog.
    pub fn from_config(
        config: &vibeforge_config::AppConfig,
        provider: Arc<dyn Provider>,
        bridge: Arc<dyn ToolBridge>,
    ) -> Self {
        Self::new(
            provider,
            bridge,
            &config.model.model,
            config.model.temperature,
            Arc::new(vibeforge_core::tool::catalog()),
            &config.agent.system_prompt,
        )
        .with_max_iterations(config.agent.max_iterations)
        .with_continue_prompt(&config.agent.continue_prompt)
    }

    /// Set the maximum number of model calls per run.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set the user message appended after every tool result.
    pub fn with_continue_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.continue_prompt = prompt.into();
        self
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn bridge_name(&self) -> &str {
        self.bridge.name()
    }

    /// Run the loop for one prompt, reporting every step through `sink`.
    ///
    /// Returns when the model answers, something fails, the iteration limit
    /// is hit, or `cancel` fires. At most one tool call is ever in flight.
    pub async fn run(&self, prompt: &str, sink: &TraceSink, cancel: &CancellationToken) -> RunOutcome {
        let mut conversation = Conversation::seeded(&self.system_prompt, prompt);
        let mut iterations = 0u32;
        let mut tool_calls = 0u32;

        info!(
            conversation_id = %conversation.id(),
            model = %self.model,
            bridge = self.bridge.name(),
            "Starting run"
        );

        let mut state = LoopState::AwaitingModel;
        let termination = loop {
            state = match state {
                LoopState::Done(termination) => break termination,
                LoopState::AwaitingModel => {
                    self.await_model(&mut conversation, &mut iterations, sink, cancel)
                        .await
                }
                LoopState::HandlingTool(call) => {
                    self.handle_tool(call, &mut conversation, &mut tool_calls, sink, cancel)
                        .await
                }
            };
        };

        info!(
            conversation_id = %conversation.id(),
            termination = %termination,
            iterations,
            tool_calls,
            "Run finished"
        );

        RunOutcome {
            termination,
            iterations,
            tool_calls,
            conversation,
        }
    }

    async fn await_model(
        &self,
        conversation: &mut Conversation,
        iterations: &mut u32,
        sink: &TraceSink,
        cancel: &CancellationToken,
    ) -> LoopState {
        if cancel.is_cancelled() {
            return LoopState::Done(Termination::Cancelled);
        }

        if *iterations >= self.max_iterations {
            warn!(
                conversation_id = %conversation.id(),
                limit = self.max_iterations,
                "Iteration limit reached"
            );
            let event = TraceEvent::IterationLimit {
                limit: self.max_iterations,
            };
            return emit_then(sink, event, Termination::IterationLimit).await;
        }

        *iterations += 1;
        debug!(
            conversation_id = %conversation.id(),
            iteration = *iterations,
            messages = conversation.len(),
            "Calling model"
        );

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: conversation.messages().to_vec(),
            tools: self.tools.as_ref().clone(),
            temperature: self.temperature,
        };

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return LoopState::Done(Termination::Cancelled),
            response = self.provider.complete(request) => response,
        };

        match response {
            Ok(response) => {
                if let Some(usage) = response.usage {
                    debug!(
                        model = %response.model,
                        total_tokens = usage.total_tokens,
                        "Model usage"
                    );
                }
                match response.step {
                    ModelStep::Final(text) => {
                        conversation.push(Message::assistant(text.clone().unwrap_or_default()));
                        emit_then(sink, TraceEvent::Assistant(text), Termination::Final).await
                    }
                    ModelStep::ToolCall(call) => {
                        let event = TraceEvent::ToolCall {
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                        };
                        if sink.emit(event).await {
                            LoopState::HandlingTool(call)
                        } else {
                            LoopState::Done(Termination::Cancelled)
                        }
                    }
                    ModelStep::Unrecognized(raw) => {
                        warn!(conversation_id = %conversation.id(), "Model returned no message and no tool call");
                        emit_then(sink, TraceEvent::Unrecognized(raw), Termination::Malformed).await
                    }
                }
            }
            Err(ProviderError::ApiError { status_code, message }) => {
                warn!(status = status_code, "Model endpoint rejected request");
                let event = TraceEvent::UpstreamError {
                    provider: self.provider.display_name().to_string(),
                    message,
                };
                emit_then(sink, event, Termination::UpstreamError).await
            }
            Err(e) => {
                warn!(error = %e, "Model call failed");
                emit_then(sink, TraceEvent::Error(e.to_string()), Termination::Failed).await
            }
        }
    }

    async fn handle_tool(
        &self,
        call: ToolCall,
        conversation: &mut Conversation,
        tool_calls: &mut u32,
        sink: &TraceSink,
        cancel: &CancellationToken,
    ) -> LoopState {
        if cancel.is_cancelled() {
            return LoopState::Done(Termination::Cancelled);
        }

        *tool_calls += 1;
        debug!(tool = %call.name, bridge = self.bridge.name(), "Dispatching tool call");

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return LoopState::Done(Termination::Cancelled),
            result = self.bridge.dispatch(&call) => result,
        };

        match result {
            Ok(result) => {
                let event = TraceEvent::tool_result(&result);
                conversation.push(Message::tool(&result.name, result.output.to_string()));
                conversation.push(Message::user(&self.continue_prompt));
                if sink.emit(event).await {
                    LoopState::AwaitingModel
                } else {
                    LoopState::Done(Termination::Cancelled)
                }
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool call failed");
                emit_then(sink, TraceEvent::Error(e.to_string()), Termination::ToolFailed).await
            }
        }
    }
}

/// Emit a terminal event; a vanished consumer turns any ending into a cancellation.
async fn emit_then(sink: &TraceSink, event: TraceEvent, termination: Termination) -> LoopState {
    if sink.emit(event).await {
        LoopState::Done(termination)
    } else {
        LoopState::Done(Termination::Cancelled)
    }
}
