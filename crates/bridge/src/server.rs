//! The bridge HTTP shim.
//!
//! - `GET /health` answers `{"ok":true}`
//! - `POST /tool/{name}` runs one tool; 200 with the result JSON, or 500
//!   with `{"error": "..."}`
//! - everything else is `404 Not found`

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use tracing::info;
use vibeforge_core::tool::{ToolBridge, ToolCall};

type SharedBridge = Arc<dyn ToolBridge>;

/// Build the bridge router around any [`ToolBridge`].
pub fn router(bridge: SharedBridge) -> Router {
    Router::new()
        .route("/health", get(health_handler).fallback(not_found))
        .route("/tool/{name}", post(tool_handler).fallback(not_found))
        .fallback(not_found)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(bridge)
}

/// Serve the bridge until the process stops.
pub async fn start(
    bridge: SharedBridge,
    host: &str,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Tool bridge listening");
    axum::serve(listener, router(bridge)).await?;
    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

fn error_response(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

async fn tool_handler(
    State(bridge): State<SharedBridge>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    let arguments = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::json!({})
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(e) => return error_response(format!("Invalid JSON body: {e}")),
        }
    };

    match bridge.dispatch(&ToolCall::new(name, arguments)).await {
        Ok(result) => (StatusCode::OK, Json(result.output)).into_response(),
        Err(e) => error_response(e.to_string()),
    }
}
