//! Triggering external automation flows with a JSON POST.

use async_trait::async_trait;
use tracing::debug;
use vibeforge_core::error::ToolError;
use vibeforge_core::text::truncate_chars;
use vibeforge_core::tool::{ToolKind, TriggerFlowArgs, TriggerFlowOutput};
use vibeforge_core::trace::RESULT_PREVIEW_CHARS;

#[async_trait]
pub trait FlowTrigger: Send + Sync {
    async fn trigger(&self, args: &TriggerFlowArgs) -> Result<TriggerFlowOutput, ToolError>;
}

pub struct HttpFlowTrigger {
    client: reqwest::Client,
}

impl HttpFlowTrigger {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FlowTrigger for HttpFlowTrigger {
    async fn trigger(&self, args: &TriggerFlowArgs) -> Result<TriggerFlowOutput, ToolError> {
        let payload = args
            .payload
            .clone()
            .unwrap_or_else(|| serde_json::json!({}));

        debug!(url = %args.url, "Triggering flow");

        let response = self
            .client
            .post(&args.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ToolError::failed(ToolKind::TriggerFlow.name(), e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ToolError::failed(ToolKind::TriggerFlow.name(), e.to_string()))?;

        Ok(TriggerFlowOutput {
            status,
            text: truncate_chars(&text, RESULT_PREVIEW_CHARS).to_string(),
        })
    }
}
