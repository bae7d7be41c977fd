//! The tool bridge.
//!
//! Turns a model's tool call into one request against a backend:
//!
//! | tool | backend |
//! |---|---|
//! | `search_templates` | embeddings + Qdrant vector search |
//! | `save_page` | PostgreSQL upsert |
//! | `put_asset` | S3-compatible PUT (SigV4) |
//! | `notify` | Apprise HTTP |
//! | `trigger_flow` | arbitrary JSON POST |
//!
//! The same [`ToolRegistry`] is used in-process by the gateway and behind
//! the HTTP shim in [`server`]; [`HttpBridge`] is the client for the shim.

pub mod assets;
pub mod client;
pub mod flow;
pub mod notify;
pub mod pages;
pub mod registry;
pub mod server;
pub mod sigv4;
pub mod templates;

pub use client::HttpBridge;
pub use registry::ToolRegistry;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use vibeforge_core::Provider;

use crate::assets::{AssetStore, S3AssetStore};
use crate::flow::HttpFlowTrigger;
use crate::notify::AppriseNotifier;
use crate::pages::PostgresPageStore;
use crate::templates::QdrantTemplateSearch;

/// Errors while assembling the bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Invalid database configuration: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Build the registry from configuration.
///
/// `embedder` produces query embeddings for template search. Without a
/// database URL `save_page` reports "DB not configured"; without object
/// store keys `put_asset` does the same for assets. Schema migration and
/// bucket creation failures are logged, not fatal.
pub async fn build_from_config(
    config: &vibeforge_config::AppConfig,
    embedder: Arc<dyn Provider>,
) -> Result<ToolRegistry, BridgeError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.model.request_timeout_secs))
        .build()?;

    let templates = QdrantTemplateSearch::new(
        client.clone(),
        &config.vector.qdrant_url,
        &config.vector.collection,
        embedder,
        &config.model.embedding_model,
    )
    .with_limit(config.vector.limit);

    let mut registry = ToolRegistry::new(
        Arc::new(templates),
        Arc::new(AppriseNotifier::new(client.clone(), &config.notify.apprise_url)),
        Arc::new(HttpFlowTrigger::new(client.clone())),
    );

    match &config.storage.database_url {
        Some(url) => {
            let store = PostgresPageStore::connect_lazy(url, config.storage.max_connections)?;
            if let Err(e) = store.migrate().await {
                warn!(error = %e, "Page schema migration failed");
            }
            registry = registry.with_pages(Arc::new(store));
        }
        None => info!("No DATABASE_URL configured; save_page is disabled"),
    }

    match S3AssetStore::from_config(client, &config.object_store) {
        Some(store) => {
            if let Err(e) = store.ensure_bucket().await {
                warn!(bucket = %config.object_store.bucket, error = %e, "Bucket check failed");
            }
            registry = registry.with_assets(Arc::new(store));
        }
        None => info!("No object store credentials configured; put_asset is disabled"),
    }

    Ok(registry)
}
