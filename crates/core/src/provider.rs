//! Provider trait, the abstraction over the model endpoint.
//!
//! One call type: "generate the next step given the full conversation and the
//! tool catalog". The answer is either a final message, exactly one requested
//! tool invocation, or something the provider could not interpret.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::Message;
use crate::tool::{ToolCall, ToolDescriptor};

/// A single "next step" request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "gpt-4o-mini")
    pub model: String,

    /// The full conversation so far
    pub messages: Vec<Message>,

    /// Tools the model may call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDescriptor>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.4
}

/// What the model decided to do on this call.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelStep {
    /// A final assistant message. `None` when the message carried no text.
    Final(Option<String>),

    /// The model wants one tool executed before it continues.
    ToolCall(ToolCall),

    /// Neither a final message nor a tool call; carries the raw payload.
    Unrecognized(serde_json::Value),
}

/// A complete response from a provider.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub step: ModelStep,

    /// Token usage statistics, when reported
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

/// An embedding request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// The model to use for embeddings (e.g., "text-embedding-3-small").
    pub model: String,

    pub input: String,
}

/// An embedding response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub embedding: Vec<f32>,

    pub model: String,
}

/// The core Provider trait.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Machine name for logs (e.g., "openai").
    fn name(&self) -> &str;

    /// Human-facing name used as the prefix of upstream error lines.
    fn display_name(&self) -> &str {
        self.name()
    }

    /// Ask the model for its next step.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;

    /// Generate an embedding for one text.
    ///
    /// Default implementation returns an error indicating embeddings aren't supported.
    async fn embed(&self, _request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        Err(ProviderError::NotConfigured(format!(
            "Provider '{}' does not support embeddings",
            self.name()
        )))
    }

    /// Can we reach the provider?
    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;

    #[async_trait]
    impl Provider for Silent {
        fn name(&self) -> &str {
            "silent"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                step: ModelStep::Final(None),
                usage: None,
                model: request.model,
            })
        }
    }

    #[test]
    fn request_temperature_defaults() {
        let req: ProviderRequest =
            serde_json::from_value(serde_json::json!({"model": "gpt-4o-mini", "messages": []}))
                .unwrap();
        assert!((req.temperature - 0.4).abs() < f32::EPSILON);
        assert!(req.tools.is_empty());
    }

    #[tokio::test]
    async fn embeddings_unsupported_by_default() {
        let err = Silent
            .embed(EmbeddingRequest {
                model: "text-embedding-3-small".into(),
                input: "hero".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
        assert_eq!(Silent.display_name(), "silent");
    }
}
