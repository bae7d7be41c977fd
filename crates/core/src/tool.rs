//! The tool declaration shared by the model-facing catalog and the bridge.
//!
//! [`ToolKind`] is the single source of truth for which tools exist, what the
//! model is told about them, and which typed record their arguments parse
//! into. The orchestrator advertises [`catalog()`]; the bridge dispatches on
//! [`ToolInvocation`], whose variants mirror `ToolKind` one to one.

use async_trait::async_trait;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// A tool definition sent to the model so it knows what it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,

    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,

    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// The unstructured record a bridge hands back for a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub name: String,

    pub output: serde_json::Value,
}

/// The tools the bridge can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    SearchTemplates,
    SavePage,
    PutAsset,
    Notify,
    TriggerFlow,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::SearchTemplates,
        ToolKind::SavePage,
        ToolKind::PutAsset,
        ToolKind::Notify,
        ToolKind::TriggerFlow,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::SearchTemplates => "search_templates",
            Self::SavePage => "save_page",
            Self::PutAsset => "put_asset",
            Self::Notify => "notify",
            Self::TriggerFlow => "trigger_flow",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::SearchTemplates => "Semantic search templates by query",
            Self::SavePage => "Save AST to a site/path",
            Self::PutAsset => "Upload a base64 asset to object storage",
            Self::Notify => "Send a notification via Apprise",
            Self::TriggerFlow => "POST a JSON payload to an external flow endpoint",
        }
    }

    pub fn parameters_schema(self) -> serde_json::Value {
        match self {
            Self::SearchTemplates => serde_json::json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "What the section should look or feel like" }
                },
                "required": ["query"]
            }),
            Self::SavePage => serde_json::json!({
                "type": "object",
                "properties": {
                    "subdomain": { "type": "string", "description": "Site identifier" },
                    "path": { "type": "string", "description": "Page path, defaults to /" },
                    "ast": { "type": "object", "description": "Structured page content" }
                },
                "required": ["subdomain", "ast"]
            }),
            Self::PutAsset => serde_json::json!({
                "type": "object",
                "properties": {
                    "key": { "type": "string", "description": "Object key inside the asset bucket" },
                    "content": { "type": "string", "description": "Base64-encoded bytes" },
                    "contentType": { "type": "string", "description": "MIME type, e.g. image/png" }
                },
                "required": ["key", "content", "contentType"]
            }),
            Self::Notify => serde_json::json!({
                "type": "object",
                "properties": {
                    "message": { "type": "string" }
                },
                "required": ["message"]
            }),
            Self::TriggerFlow => serde_json::json!({
                "type": "object",
                "properties": {
                    "url": { "type": "string", "description": "http(s) endpoint to POST to" },
                    "payload": { "type": "object", "description": "JSON body, defaults to {}" }
                },
                "required": ["url"]
            }),
        }
    }

    pub fn descriptor(self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Descriptors for every tool, in declaration order.
pub fn catalog() -> Vec<ToolDescriptor> {
    ToolKind::ALL.into_iter().map(ToolKind::descriptor).collect()
}

// --- Typed argument records ---

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchTemplatesArgs {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SavePageArgs {
    pub subdomain: String,

    #[serde(default)]
    pub path: Option<String>,

    pub ast: serde_json::Value,
}

impl SavePageArgs {
    /// The page path, `/` when omitted or blank.
    pub fn path(&self) -> &str {
        match self.path.as_deref() {
            Some(p) if !p.trim().is_empty() => p,
            _ => "/",
        }
    }
}

/// Wire form of `put_asset` arguments. Validated into an [`AssetUpload`].
#[derive(Debug, Clone, Deserialize)]
pub struct PutAssetArgs {
    pub key: String,

    #[serde(alias = "base64")]
    pub content: String,

    #[serde(rename = "contentType", alias = "content_type")]
    pub content_type: String,
}

/// A decoded asset ready for the object store.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetUpload {
    pub key: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NotifyArgs {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TriggerFlowArgs {
    pub url: String,

    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

/// A validated, typed tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInvocation {
    SearchTemplates(SearchTemplatesArgs),
    SavePage(SavePageArgs),
    PutAsset(AssetUpload),
    Notify(NotifyArgs),
    TriggerFlow(TriggerFlowArgs),
}

impl ToolInvocation {
    /// Resolve the tool by name and validate its arguments.
    ///
    /// Nothing outside this function decides whether arguments are acceptable;
    /// backends receive only records that passed here.
    pub fn parse(call: &ToolCall) -> Result<Self, ToolError> {
        let kind =
            ToolKind::from_name(&call.name).ok_or_else(|| ToolError::NotFound(call.name.clone()))?;

        match kind {
            ToolKind::SearchTemplates => {
                let args: SearchTemplatesArgs = decode(kind, &call.arguments)?;
                require_text(kind, "query", &args.query)?;
                Ok(Self::SearchTemplates(args))
            }
            ToolKind::SavePage => {
                let args: SavePageArgs = decode(kind, &call.arguments)?;
                require_text(kind, "subdomain", &args.subdomain)?;
                if args.subdomain.chars().any(|c| c.is_whitespace() || c == '/') {
                    return Err(ToolError::invalid(kind.name(), "subdomain must not contain whitespace or '/'"));
                }
                if !args.path().starts_with('/') {
                    return Err(ToolError::invalid(kind.name(), "path must start with '/'"));
                }
                if !args.ast.is_object() {
                    return Err(ToolError::invalid(kind.name(), "ast must be a JSON object"));
                }
                Ok(Self::SavePage(args))
            }
            ToolKind::PutAsset => {
                let args: PutAssetArgs = decode(kind, &call.arguments)?;
                require_text(kind, "key", &args.key)?;
                require_text(kind, "contentType", &args.content_type)?;
                if args.key.starts_with('/') {
                    return Err(ToolError::invalid(kind.name(), "key must not start with '/'"));
                }
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(args.content.trim())
                    .map_err(|e| ToolError::invalid(kind.name(), format!("content is not valid base64: {e}")))?;
                Ok(Self::PutAsset(AssetUpload {
                    key: args.key,
                    content_type: args.content_type,
                    bytes,
                }))
            }
            ToolKind::Notify => {
                let args: NotifyArgs = decode(kind, &call.arguments)?;
                require_text(kind, "message", &args.message)?;
                Ok(Self::Notify(args))
            }
            ToolKind::TriggerFlow => {
                let args: TriggerFlowArgs = decode(kind, &call.arguments)?;
                if !args.url.starts_with("http://") && !args.url.starts_with("https://") {
                    return Err(ToolError::invalid(kind.name(), "url must start with http:// or https://"));
                }
                Ok(Self::TriggerFlow(args))
            }
        }
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            Self::SearchTemplates(_) => ToolKind::SearchTemplates,
            Self::SavePage(_) => ToolKind::SavePage,
            Self::PutAsset(_) => ToolKind::PutAsset,
            Self::Notify(_) => ToolKind::Notify,
            Self::TriggerFlow(_) => ToolKind::TriggerFlow,
        }
    }
}

/// Missing arguments are treated as an empty object.
fn decode<T: DeserializeOwned>(kind: ToolKind, arguments: &serde_json::Value) -> Result<T, ToolError> {
    let value = if arguments.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        arguments.clone()
    };
    serde_json::from_value(value).map_err(|e| ToolError::invalid(kind.name(), e.to_string()))
}

fn require_text(kind: ToolKind, field: &str, value: &str) -> Result<(), ToolError> {
    if value.trim().is_empty() {
        return Err(ToolError::invalid(kind.name(), format!("{field} must not be empty")));
    }
    Ok(())
}

// --- Typed output records ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateMatch {
    pub id: serde_json::Value,

    pub score: f32,

    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchTemplatesOutput {
    pub matches: Vec<TemplateMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavePageOutput {
    pub ok: bool,
    pub subdomain: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PutAssetOutput {
    pub key: String,
    pub url: String,
}

/// Notification outcome. Delivery failures are reported here, never raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifyOutput {
    pub ok: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NotifyOutput {
    pub fn delivered(response: impl Into<String>) -> Self {
        Self {
            ok: true,
            response: Some(response.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            response: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerFlowOutput {
    pub status: u16,
    pub text: String,
}

/// A typed tool result, one variant per [`ToolKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    SearchTemplates(SearchTemplatesOutput),
    SavePage(SavePageOutput),
    PutAsset(PutAssetOutput),
    Notify(NotifyOutput),
    TriggerFlow(TriggerFlowOutput),
}

impl ToolOutput {
    pub fn kind(&self) -> ToolKind {
        match self {
            Self::SearchTemplates(_) => ToolKind::SearchTemplates,
            Self::SavePage(_) => ToolKind::SavePage,
            Self::PutAsset(_) => ToolKind::PutAsset,
            Self::Notify(_) => ToolKind::Notify,
            Self::TriggerFlow(_) => ToolKind::TriggerFlow,
        }
    }

    /// Erase into the unstructured record that crosses the bridge.
    pub fn into_result(self) -> Result<ToolResult, ToolError> {
        let name = self.kind().name().to_string();
        let output = match self {
            Self::SearchTemplates(out) => serde_json::to_value(out),
            Self::SavePage(out) => serde_json::to_value(out),
            Self::PutAsset(out) => serde_json::to_value(out),
            Self::Notify(out) => serde_json::to_value(out),
            Self::TriggerFlow(out) => serde_json::to_value(out),
        }
        .map_err(|e| ToolError::failed(name.clone(), e.to_string()))?;
        Ok(ToolResult { name, output })
    }
}

/// Something that can execute tool calls on the orchestrator's behalf.
///
/// Implemented in-process by the bridge's registry and remotely by its HTTP
/// client; the orchestrator does not know which one it talks to.
#[async_trait]
pub trait ToolBridge: Send + Sync {
    /// A short label for logs (e.g., "embedded", "http").
    fn name(&self) -> &str;

    async fn dispatch(&self, call: &ToolCall) -> Result<ToolResult, ToolError>;
}
