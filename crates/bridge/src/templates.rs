//! Semantic template search: embed the query, then ask Qdrant for neighbours.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use vibeforge_core::error::ToolError;
use vibeforge_core::provider::{EmbeddingRequest, Provider};
use vibeforge_core::tool::{SearchTemplatesArgs, SearchTemplatesOutput, TemplateMatch, ToolKind};

#[async_trait]
pub trait TemplateSearch: Send + Sync {
    async fn search(&self, args: &SearchTemplatesArgs) -> Result<SearchTemplatesOutput, ToolError>;
}

/// Qdrant-backed search using the model provider's embeddings.
pub struct QdrantTemplateSearch {
    client: reqwest::Client,
    qdrant_url: String,
    collection: String,
    limit: usize,
    embedder: Arc<dyn Provider>,
    embedding_model: String,
}

impl QdrantTemplateSearch {
    pub fn new(
        client: reqwest::Client,
        qdrant_url: impl Into<String>,
        collection: impl Into<String>,
        embedder: Arc<dyn Provider>,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            qdrant_url: qdrant_url.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            limit: 5,
            embedder,
            embedding_model: embedding_model.into(),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[derive(Deserialize)]
struct QdrantSearchResponse {
    #[serde(default)]
    result: Vec<TemplateMatch>,
}

fn failed(reason: impl Into<String>) -> ToolError {
    ToolError::failed(ToolKind::SearchTemplates.name(), reason)
}

#[async_trait]
impl TemplateSearch for QdrantTemplateSearch {
    async fn search(&self, args: &SearchTemplatesArgs) -> Result<SearchTemplatesOutput, ToolError> {
        let embedding = self
            .embedder
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                input: args.query.clone(),
            })
            .await
            .map_err(|e| failed(format!("embedding failed: {e}")))?
            .embedding;

        let url = format!(
            "{}/collections/{}/points/search",
            self.qdrant_url,
            urlencoding::encode(&self.collection)
        );
        let body = serde_json::json!({
            "vector": embedding,
            "limit": self.limit,
            "with_payload": true,
        });

        debug!(collection = %self.collection, dims = embedding.len(), "Searching templates");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| failed(format!("vector search unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(failed(format!("vector search returned {}: {text}", status.as_u16())));
        }

        let parsed: QdrantSearchResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("invalid vector search response: {e}")))?;

        Ok(SearchTemplatesOutput {
            matches: parsed.result,
        })
    }
}
