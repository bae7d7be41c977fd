//! Browser-facing HTTP server for vibeforge.
//!
//! - `POST /api/ai` runs the planning loop for `{"prompt": "..."}` and
//!   streams its trace as `text/plain`, one line per step
//! - `GET /api/tools` lists the tools the model is offered
//! - `GET /health` for liveness probes
//! - `GET /` serves the embedded page
//!
//! Built on Axum.

pub mod frontend;
pub mod reporter;

#[cfg(test)]
mod test_support;

pub use reporter::{Reporter, TraceStream};

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, info_span};

use vibeforge_agent::Orchestrator;
use vibeforge_core::tool::{ToolBridge, ToolDescriptor};
use vibeforge_core::Provider;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub reporter: Reporter,
}

impl GatewayState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            reporter: Reporter::new(orchestrator),
        }
    }
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    // Same-origin page; local development origins are allowed too.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
            is_local_origin(origin.as_bytes())
        }))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/ai", post(ai_handler))
        .route("/api/tools", get(tools_handler))
        .with_state(state)
        .merge(frontend::frontend_router())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// `http://localhost` or `http://127.0.0.1`, with an optional numeric port.
fn is_local_origin(origin: &[u8]) -> bool {
    [b"http://localhost".as_slice(), b"http://127.0.0.1".as_slice()]
        .into_iter()
        .filter_map(|host| origin.strip_prefix(host))
        .any(|rest| match rest.split_first() {
            None => true,
            Some((b':', port)) => !port.is_empty() && port.iter().all(u8::is_ascii_digit),
            Some(_) => false,
        })
}

/// Pick the tool bridge: a remote shim when `bridge.url` is set, otherwise
/// the registry in-process.
pub async fn connect_bridge(
    config: &vibeforge_config::AppConfig,
    provider: Arc<dyn Provider>,
) -> Result<Arc<dyn ToolBridge>, vibeforge_bridge::BridgeError> {
    match &config.bridge.url {
        Some(url) => {
            info!(url = %url, "Using remote tool bridge");
            Ok(Arc::new(vibeforge_bridge::HttpBridge::new(
                url,
                Duration::from_secs(config.model.request_timeout_secs),
            )))
        }
        None => {
            info!("Using embedded tool bridge");
            Ok(Arc::new(
                vibeforge_bridge::build_from_config(config, provider).await?,
            ))
        }
    }
}

/// Start the gateway HTTP server.
pub async fn start(config: vibeforge_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let provider = vibeforge_providers::build_from_config(&config);
    let bridge = connect_bridge(&config, provider.clone()).await?;
    let orchestrator = Orchestrator::from_config(&config, provider, bridge);

    info!(
        addr = %addr,
        model = %config.model.model,
        provider = orchestrator.provider_name(),
        bridge = orchestrator.bridge_name(),
        "Gateway starting"
    );
    let app = build_router(Arc::new(GatewayState::new(orchestrator)));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn tools_handler(State(state): State<SharedState>) -> Json<Vec<ToolDescriptor>> {
    Json(state.reporter.orchestrator().tools().to_vec())
}

fn bad_request(message: &'static str) -> Response {
    (StatusCode::BAD_REQUEST, message).into_response()
}

/// Extract a usable prompt from the request body.
///
/// An empty body counts as `{}`.
fn parse_prompt(body: &[u8]) -> Result<String, &'static str> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err("Missing prompt");
    }
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| "Invalid JSON body")?;
    match value.get("prompt").and_then(|p| p.as_str()) {
        Some(prompt) if !prompt.trim().is_empty() => Ok(prompt.to_string()),
        _ => Err("Missing prompt"),
    }
}

async fn ai_handler(State(state): State<SharedState>, body: Bytes) -> Response {
    let prompt = match parse_prompt(&body) {
        Ok(prompt) => prompt,
        Err(message) => return bad_request(message),
    };

    let request_id = uuid::Uuid::new_v4();
    let span = info_span!("planning", %request_id);
    let stream = span.in_scope(|| {
        info!(prompt_chars = prompt.chars().count(), "Planning request");
        state.reporter.open(prompt)
    });

    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream),
    )
        .into_response()
}
