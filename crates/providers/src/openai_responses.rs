//! OpenAI Responses API provider.
//!
//! One `POST /responses` per step. The reply's `output` array is reduced to a
//! single [`ModelStep`]: a final assistant message, the first tool call, or
//! the raw body when neither is present.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vibeforge_core::error::ProviderError;
use vibeforge_core::message::{Message, Role};
use vibeforge_core::provider::*;
use vibeforge_core::tool::{ToolCall, ToolDescriptor};

/// A provider speaking the OpenAI Responses API.
pub struct OpenAiResponsesProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiResponsesProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    pub fn from_config(config: &vibeforge_config::ModelConfig) -> Self {
        Self::new(
            &config.base_url,
            config.api_key.clone().unwrap_or_default(),
            std::time::Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn to_api_input(messages: &[Message]) -> Vec<ApiInputMessage<'_>> {
        messages
            .iter()
            .map(|m| ApiInputMessage {
                role: match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                    Role::Tool => "tool",
                },
                content: &m.content,
                name: m.name.as_deref(),
            })
            .collect()
    }

    fn to_api_tools(tools: &[ToolDescriptor]) -> Vec<ApiTool<'_>> {
        tools
            .iter()
            .map(|t| ApiTool {
                r#type: "function",
                name: &t.name,
                description: &t.description,
                parameters: &t.parameters,
            })
            .collect()
    }

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ProviderError> {
        let url = format!("{}{path}", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), path, "Model endpoint returned error");
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: text,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {e}")))
    }
}

/// Reduce a Responses API body to the step the model chose.
pub fn interpret_output(body: &serde_json::Value) -> ModelStep {
    let Some(output) = body.get("output").and_then(|o| o.as_array()) else {
        return ModelStep::Unrecognized(body.clone());
    };

    if let Some(last) = output.last() {
        if last["type"] == "message" && last["role"] == "assistant" {
            let text = last["content"]
                .get(0)
                .and_then(|c| c["text"].as_str())
                .filter(|t| !t.is_empty())
                .map(String::from);
            return ModelStep::Final(text);
        }
    }

    let call = output
        .iter()
        .find(|item| matches!(item["type"].as_str(), Some("tool_call" | "function_call")));

    match call {
        Some(item) => match item["name"].as_str() {
            Some(name) => ModelStep::ToolCall(ToolCall::new(name, parse_arguments(&item["arguments"]))),
            None => ModelStep::Unrecognized(body.clone()),
        },
        None => ModelStep::Unrecognized(body.clone()),
    }
}

/// Arguments arrive as a JSON-encoded string; anything unparsable is kept as
/// the raw string so the bridge can reject it with a precise reason.
fn parse_arguments(raw: &serde_json::Value) -> serde_json::Value {
    match raw {
        serde_json::Value::String(s) if s.trim().is_empty() => serde_json::json!({}),
        serde_json::Value::String(s) => {
            serde_json::from_str(s).unwrap_or_else(|_| serde_json::Value::String(s.clone()))
        }
        other => other.clone(),
    }
}

#[async_trait]
impl Provider for OpenAiResponsesProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn display_name(&self) -> &str {
        "OpenAI"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut body = serde_json::json!({
            "model": request.model,
            "input": Self::to_api_input(&request.messages),
            "temperature": request.temperature,
        });

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
            body["tool_choice"] = serde_json::json!("auto");
        }

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Sending responses request"
        );

        let reply = self.post_json("/responses", &body).await?;

        let usage = reply
            .get("usage")
            .and_then(|u| serde_json::from_value::<ApiUsage>(u.clone()).ok())
            .map(|u| Usage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
                total_tokens: u.total_tokens,
            });

        let model = reply["model"]
            .as_str()
            .map(String::from)
            .unwrap_or(request.model);

        Ok(ProviderResponse {
            step: interpret_output(&reply),
            usage,
            model,
        })
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        let body = serde_json::json!({
            "model": request.model,
            "input": request.input,
        });

        debug!(model = %request.model, "Sending embedding request");

        let reply = self.post_json("/embeddings", &body).await?;
        let parsed: EmbeddingApiResponse = serde_json::from_value(reply).map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse embedding response: {e}"))
        })?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ProviderError::InvalidResponse("No embedding in response".into()))?;

        Ok(EmbeddingResponse {
            embedding,
            model: parsed.model.unwrap_or(request.model),
        })
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- Wire types ---

#[derive(Debug, Serialize)]
struct ApiInputMessage<'a> {
    role: &'static str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ApiTool<'a> {
    r#type: &'static str,
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingData>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use vibeforge_core::tool::catalog;
    use vibeforge_core::TraceEvent;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OpenAiResponsesProvider {
        OpenAiResponsesProvider::new(server.uri(), "sk-test", Duration::from_secs(5))
    }

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![Message::system("plan"), Message::user("Say hello")],
            tools: catalog(),
            temperature: 0.4,
        }
    }

    #[test]
    fn final_message_is_last_assistant_item() {
        let body = json!({"output": [
            {"type": "reasoning"},
            {"type": "message", "role": "assistant", "content": [{"type": "output_text", "text": "Hi"}]}
        ]});
        assert_eq!(interpret_output(&body), ModelStep::Final(Some("Hi".into())));
    }

    #[test]
    fn final_message_without_text() {
        let body = json!({"output": [{"type": "message", "role": "assistant", "content": []}]});
        assert_eq!(interpret_output(&body), ModelStep::Final(None));
    }

    #[test]
    fn final_message_with_empty_text_has_no_text() {
        let body = json!({"output": [{
            "type": "message",
            "role": "assistant",
            "content": [{"type": "output_text", "text": ""}]
        }]});
        let ModelStep::Final(text) = interpret_output(&body) else {
            panic!("expected final message");
        };
        assert_eq!(text, None);
        assert_eq!(TraceEvent::Assistant(text).render(), "ASSISTANT: [no text]");
    }

    #[test]
    fn first_tool_call_wins_and_string_arguments_are_parsed() {
        let body = json!({"output": [
            {"type": "function_call", "name": "search_templates", "arguments": "{\"query\":\"restaurant hero\"}"},
            {"type": "function_call", "name": "save_page", "arguments": "{}"}
        ]});
        let ModelStep::ToolCall(call) = interpret_output(&body) else {
            panic!("expected tool call");
        };
        assert_eq!(call.name, "search_templates");
        assert_eq!(call.arguments, json!({"query": "restaurant hero"}));
    }

    #[test]
    fn tool_call_type_is_accepted() {
        let body = json!({"output": [
            {"type": "tool_call", "name": "notify", "arguments": {"message": "done"}}
        ]});
        assert_eq!(
            interpret_output(&body),
            ModelStep::ToolCall(ToolCall::new("notify", json!({"message": "done"})))
        );
    }

    #[test]
    fn unparsable_arguments_are_kept_raw() {
        assert_eq!(parse_arguments(&json!("{not json")), json!("{not json"));
        assert_eq!(parse_arguments(&json!("")), json!({}));
    }

    #[test]
    fn missing_output_is_unrecognized() {
        let body = json!({"id": "resp_1", "status": "incomplete"});
        assert_eq!(interpret_output(&body), ModelStep::Unrecognized(body.clone()));

        let body = json!({"output": [{"type": "reasoning"}]});
        assert_eq!(interpret_output(&body), ModelStep::Unrecognized(body.clone()));
    }

    #[test]
    fn input_messages_carry_tool_names() {
        let messages = vec![Message::user("hi"), Message::tool("notify", "{}")];
        let input = serde_json::to_value(OpenAiResponsesProvider::to_api_input(&messages)).unwrap();
        assert_eq!(input[0], json!({"role": "user", "content": "hi"}));
        assert_eq!(input[1]["name"], "notify");
        assert_eq!(input[1]["role"], "tool");
    }

    #[test]
    fn tools_use_flat_function_format() {
        let tools = serde_json::to_value(OpenAiResponsesProvider::to_api_tools(&catalog())).unwrap();
        assert_eq!(tools[0]["type"], "function");
        assert_eq!(tools[0]["name"], "search_templates");
        assert!(tools[0]["parameters"]["properties"]["query"].is_object());
    }

    #[tokio::test]
    async fn complete_posts_to_responses_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"model": "gpt-4o-mini", "tool_choice": "auto"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gpt-4o-mini-2024-07-18",
                "output": [{"type": "message", "role": "assistant",
                            "content": [{"type": "output_text", "text": "{\"sections\":[]}"}]}],
                "usage": {"input_tokens": 12, "output_tokens": 4, "total_tokens": 16}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(&server).complete(request()).await.unwrap();
        assert_eq!(response.step, ModelStep::Final(Some("{\"sections\":[]}".into())));
        assert_eq!(response.model, "gpt-4o-mini-2024-07-18");
        assert_eq!(response.usage.map(|u| u.total_tokens), Some(16));
    }

    #[tokio::test]
    async fn non_success_status_is_api_error_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"error":"bad key"}"#))
            .mount(&server)
            .await;

        let err = provider(&server).complete(request()).await.unwrap_err();
        match err {
            ProviderError::ApiError { status_code, message } => {
                assert_eq!(status_code, 401);
                assert_eq!(message, r#"{"error":"bad key"}"#);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_success_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = provider(&server).complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        let provider =
            OpenAiResponsesProvider::new("http://127.0.0.1:1", "sk-test", Duration::from_secs(2));
        let err = provider.complete(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }

    #[tokio::test]
    async fn embed_returns_first_vector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(body_partial_json(json!({"model": "text-embedding-3-small", "input": "hero"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"embedding": [0.1, 0.2, 0.3]}],
                "model": "text-embedding-3-small"
            })))
            .mount(&server)
            .await;

        let response = provider(&server)
            .embed(EmbeddingRequest {
                model: "text-embedding-3-small".into(),
                input: "hero".into(),
            })
            .await
            .unwrap();
        assert_eq!(response.embedding, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn display_name_prefixes_upstream_errors() {
        let provider =
            OpenAiResponsesProvider::new("https://api.openai.com/v1/", "k", Duration::from_secs(1));
        assert_eq!(provider.display_name(), "OpenAI");
        assert_eq!(provider.base_url, "https://api.openai.com/v1");
    }
}
