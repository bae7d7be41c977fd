//! Model provider implementations for vibeforge.
//!
//! All providers implement the `vibeforge_core::Provider` trait.
//! [`build_from_config`] picks the one the configuration asks for.

pub mod openai_responses;

pub use openai_responses::OpenAiResponsesProvider;

use std::sync::Arc;
use vibeforge_core::Provider;

/// Build the model provider from configuration.
///
/// A missing API key is not an error here: the endpoint will answer 401 and
/// the orchestrator reports that like any other upstream failure.
pub fn build_from_config(config: &vibeforge_config::AppConfig) -> Arc<dyn Provider> {
    if config.model.api_key.is_none() {
        tracing::warn!("No model API key configured; set OPENAI_API_KEY");
    }
    Arc::new(OpenAiResponsesProvider::from_config(&config.model))
}
