//! Scripted collaborators for orchestrator tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use vibeforge_core::error::{ProviderError, ToolError};
use vibeforge_core::provider::{ModelStep, Provider, ProviderRequest, ProviderResponse};
use vibeforge_core::tool::{ToolBridge, ToolCall, ToolResult};

/// A provider that replays a script of steps and records every request.
///
/// When the script runs out it keeps answering with `fallback`, or panics
/// when there is none.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ModelStep, ProviderError>>>,
    fallback: Option<ModelStep>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<ModelStep, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn steps(steps: Vec<ModelStep>) -> Self {
        Self::new(steps.into_iter().map(Ok).collect())
    }

    /// Answer every call with the same step.
    pub fn repeating(step: ModelStep) -> Self {
        Self {
            fallback: Some(step),
            ..Self::new(Vec::new())
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn display_name(&self) -> &str {
        "Scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);

        let next = self.script.lock().unwrap().pop_front();
        let step = match next {
            Some(step) => step?,
            None => match &self.fallback {
                Some(step) => step.clone(),
                None => panic!("ScriptedProvider: script exhausted"),
            },
        };

        Ok(ProviderResponse {
            step,
            usage: None,
            model,
        })
    }
}

/// A provider whose calls never finish.
pub struct HangingProvider;

#[async_trait]
impl Provider for HangingProvider {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        std::future::pending().await
    }
}

/// Cancels the run from inside the model call, then answers with `step`.
pub struct CancellingProvider {
    cancel: CancellationToken,
    step: ModelStep,
}

impl CancellingProvider {
    pub fn new(cancel: CancellationToken, step: ModelStep) -> Self {
        Self { cancel, step }
    }
}

#[async_trait]
impl Provider for CancellingProvider {
    fn name(&self) -> &str {
        "cancelling"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.cancel.cancel();
        Ok(ProviderResponse {
            step: self.step.clone(),
            usage: None,
            model: request.model,
        })
    }
}

/// A bridge with canned outputs per tool name.
#[derive(Default)]
pub struct CannedBridge {
    outputs: HashMap<String, Result<serde_json::Value, ToolError>>,
    calls: Mutex<Vec<ToolCall>>,
}

impl CannedBridge {
    pub fn with(mut self, tool: &str, output: Result<serde_json::Value, ToolError>) -> Self {
        self.outputs.insert(tool.to_string(), output);
        self
    }

    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolBridge for CannedBridge {
    fn name(&self) -> &str {
        "canned"
    }

    async fn dispatch(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        self.calls.lock().unwrap().push(call.clone());
        match self.outputs.get(&call.name) {
            Some(Ok(output)) => Ok(ToolResult {
                name: call.name.clone(),
                output: output.clone(),
            }),
            Some(Err(e)) => Err(e.clone()),
            None => Err(ToolError::NotFound(call.name.clone())),
        }
    }
}
