//! Notifications through an Apprise HTTP endpoint.
//!
//! Delivery problems never fail the tool call: they come back as
//! `{ok: false, error}` so the model can decide what to do.

use async_trait::async_trait;
use tracing::warn;
use vibeforge_core::text::truncate_chars;
use vibeforge_core::tool::{NotifyArgs, NotifyOutput};
use vibeforge_core::trace::RESULT_PREVIEW_CHARS;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, args: &NotifyArgs) -> NotifyOutput;
}

pub struct AppriseNotifier {
    client: reqwest::Client,
    url: String,
}

impl AppriseNotifier {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for AppriseNotifier {
    async fn notify(&self, args: &NotifyArgs) -> NotifyOutput {
        let sent = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "body": args.message }))
            .send()
            .await;

        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Notification delivery failed");
                return NotifyOutput::failed(e.to_string());
            }
        };

        if !response.status().is_success() {
            warn!(status = response.status().as_u16(), "Notification endpoint returned error");
        }

        match response.text().await {
            Ok(text) => NotifyOutput::delivered(truncate_chars(&text, RESULT_PREVIEW_CHARS)),
            Err(e) => NotifyOutput::failed(e.to_string()),
        }
    }
}
