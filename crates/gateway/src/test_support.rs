//! Stand-in model and bridge for gateway tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use vibeforge_agent::Orchestrator;
use vibeforge_core::error::{ProviderError, ToolError};
use vibeforge_core::provider::{ModelStep, Provider, ProviderRequest, ProviderResponse};
use vibeforge_core::tool::{catalog, ToolBridge, ToolCall, ToolResult};

pub fn orchestrator(provider: Arc<dyn Provider>, bridge: Arc<dyn ToolBridge>) -> Orchestrator {
    Orchestrator::new(provider, bridge, "gpt-4o-mini", 0.4, Arc::new(catalog()), "plan")
}

/// Replays steps in order and counts calls.
pub struct Script {
    steps: Mutex<VecDeque<ModelStep>>,
    calls: AtomicUsize,
}

impl Script {
    pub fn new(steps: Vec<ModelStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for Script {
    fn name(&self) -> &str {
        "script"
    }

    fn display_name(&self) -> &str {
        "OpenAI"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ProviderError::InvalidResponse("script exhausted".into()))?;
        Ok(ProviderResponse {
            step,
            usage: None,
            model: request.model,
        })
    }
}

pub struct PanickingProvider;

#[async_trait]
impl Provider for PanickingProvider {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        panic!("provider blew up");
    }
}

/// Never answers; records when its pending call is abandoned.
#[derive(Default)]
pub struct DropFlagProvider {
    pub started: Notify,
    dropped: Arc<AtomicBool>,
}

impl DropFlagProvider {
    pub fn dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }
}

struct SetOnDrop(Arc<AtomicBool>);

impl Drop for SetOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Provider for DropFlagProvider {
    fn name(&self) -> &str {
        "drop_flag"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let _flag = SetOnDrop(self.dropped.clone());
        self.started.notify_one();
        std::future::pending().await
    }
}

/// Answers every call with `{"tool": <name>}`.
pub struct CannedBridge;

#[async_trait]
impl ToolBridge for CannedBridge {
    fn name(&self) -> &str {
        "canned"
    }

    async fn dispatch(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        Ok(ToolResult {
            name: call.name.clone(),
            output: serde_json::json!({ "tool": call.name }),
        })
    }
}
