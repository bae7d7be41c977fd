//! Page persistence.
//!
//! A save creates the site row if it is missing, then upserts the page keyed
//! by `(site_id, path)`. Saving the same path twice overwrites the AST.
//!
//! The schema lives in `migrations/001_create_pages.sql`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use tokio::sync::RwLock;
use tracing::{debug, info};
use vibeforge_core::error::ToolError;
use vibeforge_core::tool::{SavePageArgs, SavePageOutput, ToolKind};

#[async_trait]
pub trait PageStore: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    async fn save(&self, args: &SavePageArgs) -> Result<SavePageOutput, ToolError>;

    /// The stored AST for a page, if any.
    async fn load(&self, subdomain: &str, path: &str) -> Result<Option<serde_json::Value>, ToolError>;
}

fn failed(reason: impl Into<String>) -> ToolError {
    ToolError::failed(ToolKind::SavePage.name(), reason)
}

/// PostgreSQL page store.
pub struct PostgresPageStore {
    pool: PgPool,
}

impl PostgresPageStore {
    /// Create a store whose pool connects on first use.
    pub fn connect_lazy(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    /// Run the schema migration.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        let migration_sql = include_str!("../migrations/001_create_pages.sql");
        sqlx::raw_sql(migration_sql).execute(&self.pool).await?;
        info!("Page schema migration complete");
        Ok(())
    }
}

#[async_trait]
impl PageStore for PostgresPageStore {
    fn name(&self) -> &str {
        "postgres"
    }

    async fn save(&self, args: &SavePageArgs) -> Result<SavePageOutput, ToolError> {
        let path = args.path();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| failed(format!("database unavailable: {e}")))?;

        sqlx::query("INSERT INTO sites (id, subdomain) VALUES ($1, $1) ON CONFLICT DO NOTHING")
            .bind(&args.subdomain)
            .execute(&mut *tx)
            .await
            .map_err(|e| failed(e.to_string()))?;

        sqlx::query(
            "INSERT INTO pages (site_id, path, ast, updated_at) VALUES ($1, $2, $3, now()) \
             ON CONFLICT (site_id, path) DO UPDATE SET ast = EXCLUDED.ast, updated_at = now()",
        )
        .bind(&args.subdomain)
        .bind(path)
        .bind(Json(&args.ast))
        .execute(&mut *tx)
        .await
        .map_err(|e| failed(e.to_string()))?;

        tx.commit().await.map_err(|e| failed(e.to_string()))?;

        debug!(subdomain = %args.subdomain, path, "Page saved");
        Ok(SavePageOutput {
            ok: true,
            subdomain: args.subdomain.clone(),
            path: path.to_string(),
        })
    }

    async fn load(&self, subdomain: &str, path: &str) -> Result<Option<serde_json::Value>, ToolError> {
        let row: Option<Json<serde_json::Value>> =
            sqlx::query_scalar("SELECT ast FROM pages WHERE site_id = $1 AND path = $2")
                .bind(subdomain)
                .bind(path)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| failed(e.to_string()))?;
        Ok(row.map(|Json(ast)| ast))
    }
}

/// Process-local page store, for tests and database-less runs.
#[derive(Default, Clone)]
pub struct InMemoryPageStore {
    pages: Arc<RwLock<HashMap<(String, String), serde_json::Value>>>,
}

impl InMemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.pages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pages.read().await.is_empty()
    }
}

#[async_trait]
impl PageStore for InMemoryPageStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn save(&self, args: &SavePageArgs) -> Result<SavePageOutput, ToolError> {
        let path = args.path().to_string();
        self.pages
            .write()
            .await
            .insert((args.subdomain.clone(), path.clone()), args.ast.clone());
        Ok(SavePageOutput {
            ok: true,
            subdomain: args.subdomain.clone(),
            path,
        })
    }

    async fn load(&self, subdomain: &str, path: &str) -> Result<Option<serde_json::Value>, ToolError> {
        Ok(self
            .pages
            .read()
            .await
            .get(&(subdomain.to_string(), path.to_string()))
            .cloned())
    }
}
