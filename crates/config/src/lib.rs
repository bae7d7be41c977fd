//! Configuration loading, validation, and management for vibeforge.
//!
//! Loads configuration from `~/.vibeforge/config.toml` (or the file named by
//! `VIBEFORGE_CONFIG`) and then applies environment variable overrides, so a
//! container deployment can be driven purely by env vars.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.vibeforge/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model endpoint settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Planning loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Browser-facing HTTP server
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Tool bridge (remote URL or embedded)
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Relational store for pages
    #[serde(default)]
    pub storage: StorageConfig,

    /// Vector search for templates
    #[serde(default)]
    pub vector: VectorConfig,

    /// S3-compatible asset storage
    #[serde(default)]
    pub object_store: ObjectStoreConfig,

    /// Notification endpoint
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-request timeout for every outbound HTTP call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_temperature() -> f32 {
    0.4
}
fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Nudge appended after every tool result
    #[serde(default = "default_continue_prompt")]
    pub continue_prompt: String,

    /// Maximum model calls per request
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

fn default_system_prompt() -> String {
    "You are a website section planner. When needed, call tools to search templates \
     and save a page. Output succinct JSON AST when done."
        .into()
}
fn default_continue_prompt() -> String {
    "Continue.".into()
}
fn default_max_iterations() -> u32 {
    25
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            continue_prompt: default_continue_prompt(),
            max_iterations: default_max_iterations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_gateway_port() -> u16 {
    3000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_gateway_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Base URL of a running bridge. `None` = dispatch in-process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Bind address when serving the bridge
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_bridge_port")]
    pub port: u16,
}

fn default_bridge_port() -> u16 {
    8710
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: default_host(),
            port: default_bridge_port(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// PostgreSQL connection string. Pages cannot be saved without it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("database_url", &redact(&self.database_url))
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

fn default_qdrant_url() -> String {
    "http://qdrant:6333".into()
}
fn default_collection() -> String {
    "templates".into()
}
fn default_search_limit() -> usize {
    5
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            qdrant_url: default_qdrant_url(),
            collection: default_collection(),
            limit: default_search_limit(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    #[serde(default = "default_object_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_object_port")]
    pub port: u16,

    #[serde(default)]
    pub use_ssl: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,

    #[serde(default = "default_bucket")]
    pub bucket: String,

    #[serde(default = "default_region")]
    pub region: String,
}

fn default_object_endpoint() -> String {
    "minio".into()
}
fn default_object_port() -> u16 {
    9000
}
fn default_bucket() -> String {
    "thelux".into()
}
fn default_region() -> String {
    "us-east-1".into()
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: default_object_endpoint(),
            port: default_object_port(),
            use_ssl: false,
            access_key: None,
            secret_key: None,
            bucket: default_bucket(),
            region: default_region(),
        }
    }
}

impl std::fmt::Debug for ObjectStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreConfig")
            .field("endpoint", &self.endpoint)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("access_key", &redact(&self.access_key))
            .field("secret_key", &redact(&self.secret_key))
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_apprise_url")]
    pub apprise_url: String,
}

fn default_apprise_url() -> String {
    "http://apprise:8000/notify".into()
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            apprise_url: default_apprise_url(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `VIBEFORGE_CONFIG` or `~/.vibeforge/config.toml`,
    /// then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("VIBEFORGE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::config_dir().join("config.toml"));
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the environment (highest priority).
    ///
    /// `lookup` is `std::env::var` in production; tests pass a map.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.model.api_key = Some(key);
        }
        if let Some(url) = non_empty("OPENAI_BASE_URL") {
            self.model.base_url = url;
        }
        if let Some(model) = non_empty("OPENAI_MODEL") {
            self.model.model = model;
        }
        if let Some(url) = non_empty("MCP_URL") {
            self.bridge.url = Some(url);
        }
        if let Some(url) = non_empty("DATABASE_URL") {
            self.storage.database_url = Some(url);
        }
        if let Some(url) = non_empty("QDRANT_URL") {
            self.vector.qdrant_url = url;
        }
        if let Some(collection) = non_empty("QDRANT_COLLECTION") {
            self.vector.collection = collection;
        }
        if let Some(endpoint) = non_empty("MINIO_ENDPOINT") {
            self.object_store.endpoint = endpoint;
        }
        if let Some(port) = non_empty("MINIO_PORT") {
            self.object_store.port = parse_env("MINIO_PORT", &port)?;
        }
        if let Some(ssl) = non_empty("MINIO_SSL") {
            self.object_store.use_ssl = ssl == "true";
        }
        if let Some(key) = non_empty("MINIO_ACCESS_KEY") {
            self.object_store.access_key = Some(key);
        }
        if let Some(key) = non_empty("MINIO_SECRET_KEY") {
            self.object_store.secret_key = Some(key);
        }
        if let Some(bucket) = non_empty("MINIO_BUCKET") {
            self.object_store.bucket = bucket;
        }
        if let Some(url) = non_empty("APPRISE_URL") {
            self.notify.apprise_url = url;
        }
        if let Some(max) = non_empty("VIBEFORGE_MAX_ITERATIONS") {
            self.agent.max_iterations = parse_env("VIBEFORGE_MAX_ITERATIONS", &max)?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".vibeforge")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::ValidationError(
                "model.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        if self.model.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "model.request_timeout_secs must be at least 1".into(),
            ));
        }

        if self.vector.limit == 0 {
            return Err(ConfigError::ValidationError(
                "vector.limit must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.model.api_key.is_some()
    }

    /// Generate a default config TOML string (for `init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::ValidationError(format!("{key} has an invalid value: {value}")))
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
