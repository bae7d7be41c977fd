//! HTTP client for a remote bridge.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use vibeforge_core::error::ToolError;
use vibeforge_core::tool::{ToolBridge, ToolCall, ToolResult};

/// Dispatches tool calls to a bridge shim over HTTP.
pub struct HttpBridge {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBridge {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Can we reach the bridge?
    pub async fn health(&self) -> Result<bool, ToolError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| ToolError::Bridge(format!("bridge unreachable: {e}")))?;
        Ok(response.status().is_success())
    }
}

/// Pull the `error` field out of a failure body, falling back to the raw text.
fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("bridge returned {status}")
            } else {
                body.to_string()
            }
        })
}

#[async_trait]
impl ToolBridge for HttpBridge {
    fn name(&self) -> &str {
        "http"
    }

    async fn dispatch(&self, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let url = format!("{}/tool/{}", self.base_url, urlencoding::encode(&call.name));
        let arguments = if call.arguments.is_null() {
            serde_json::json!({})
        } else {
            call.arguments.clone()
        };

        debug!(tool = %call.name, url = %url, "Calling bridge");

        let response = self
            .client
            .post(&url)
            .json(&arguments)
            .send()
            .await
            .map_err(|e| ToolError::Bridge(format!("bridge unreachable: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ToolError::Bridge(e.to_string()))?;

        if !status.is_success() {
            return Err(ToolError::Bridge(error_message(status.as_u16(), &text)));
        }

        let output = serde_json::from_str(&text)
            .map_err(|e| ToolError::Bridge(format!("invalid bridge response: {e}")))?;

        Ok(ToolResult {
            name: call.name.clone(),
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::PageStore;
    use crate::registry::tests::local_registry;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn bridge(server: &MockServer) -> HttpBridge {
        HttpBridge::new(server.uri(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn posts_arguments_to_tool_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tool/notify"))
            .and(body_json(json!({"message": "hi"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "response": "sent"})))
            .expect(1)
            .mount(&server)
            .await;

        let result = bridge(&server)
            .dispatch(&ToolCall::new("notify", json!({"message": "hi"})))
            .await
            .unwrap();

        assert_eq!(result.name, "notify");
        assert_eq!(result.output["response"], "sent");
    }

    #[tokio::test]
    async fn failure_status_carries_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "DB not configured"})))
            .mount(&server)
            .await;

        let err = bridge(&server)
            .dispatch(&ToolCall::new("save_page", json!({})))
            .await
            .unwrap_err();

        assert!(matches!(&err, ToolError::Bridge(msg) if msg == "DB not configured"));
    }

    #[tokio::test]
    async fn failure_without_json_body_keeps_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
            .mount(&server)
            .await;

        let err = bridge(&server)
            .dispatch(&ToolCall::new("notify", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Bridge error: Not found");
    }

    #[tokio::test]
    async fn unreachable_bridge_is_error() {
        let bridge = HttpBridge::new("http://127.0.0.1:1", Duration::from_secs(2));
        let err = bridge
            .dispatch(&ToolCall::new("notify", json!({"message": "x"})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("bridge unreachable"));
        assert!(bridge.health().await.is_err());
    }

    #[test]
    fn error_message_fallbacks() {
        assert_eq!(error_message(500, r#"{"error":"boom"}"#), "boom");
        assert_eq!(error_message(502, ""), "bridge returned 502");
        assert_eq!(error_message(500, "plain"), "plain");
    }

    #[tokio::test]
    async fn talks_to_a_real_shim() {
        let (registry, pages, _) = local_registry();
        let app = crate::server::router(Arc::new(registry));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let bridge = HttpBridge::new(format!("http://{addr}"), Duration::from_secs(5));
        assert!(bridge.health().await.unwrap());

        let result = bridge
            .dispatch(&ToolCall::new(
                "save_page",
                json!({"subdomain": "luigis", "ast": {"hero": true}}),
            ))
            .await
            .unwrap();
        assert_eq!(result.output["path"], "/");
        assert_eq!(pages.load("luigis", "/").await.unwrap(), Some(json!({"hero": true})));

        let err = bridge.dispatch(&ToolCall::new("x", json!({}))).await.unwrap_err();
        assert_eq!(err.to_string(), "Bridge error: Unknown tool: x");
    }
}
