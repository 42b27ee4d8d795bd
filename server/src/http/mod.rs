//! The HTTP surface: `/mcp`, extension ingestion, admin routes, and the
//! CORS / extension-gating middleware.

pub mod admin;
pub mod ingest;
pub mod screenshots;

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::Method;
use axum::http::StatusCode;
use axum::http::header;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;

use gasoline_protocol::JsonRpcRequest;
use gasoline_protocol::JsonRpcResponse;

use crate::CLIENT_HEADER;
use crate::EXTENSION_HEADER;
use crate::mcp;
use crate::state::ServerState;

/// Default body cap for POST bodies.
pub const BODY_LIMIT: usize = 1024 * 1024;

/// Tighter cap for the settings route.
pub const SETTINGS_BODY_LIMIT: usize = 10 * 1024;

/// Build the daemon router.
pub fn router(state: Arc<ServerState>) -> Router {
    // Extension-facing routes sit behind the extension-header gate.
    let extension_routes = Router::new()
        .route("/logs", post(ingest::logs))
        .route("/network-bodies", post(ingest::network_bodies))
        .route("/network-waterfall", post(ingest::network_waterfall))
        .route("/websocket-events", post(ingest::websocket_events))
        .route("/websocket-status", post(ingest::websocket_status))
        .route("/enhanced-actions", post(ingest::enhanced_actions))
        .route("/performance-snapshots", post(ingest::performance_snapshots))
        .route("/query-result", post(ingest::query_result))
        .route("/sync", post(ingest::sync))
        .route("/commands", get(ingest::poll_commands))
        .route("/draw-mode/complete", post(ingest::draw_mode_complete))
        .route("/screenshots", post(screenshots::intake))
        .layer(axum::middleware::from_fn(extension_only));

    Router::new()
        .route("/mcp", post(mcp_endpoint))
        .route("/health", get(admin::health))
        .route("/doctor", get(admin::doctor))
        .route("/diagnostics", get(admin::diagnostics))
        .route("/diagnostics.json", get(admin::diagnostics))
        .route("/shutdown", post(admin::shutdown))
        .route("/clients", get(admin::list_clients).post(admin::register_client))
        .route("/clients/{id}", get(admin::get_client).delete(admin::remove_client))
        .route("/telemetry", get(admin::telemetry))
        .route("/openapi.json", get(admin::openapi))
        .route("/", get(admin::dashboard))
        .route(
            "/settings",
            post(admin::update_settings).layer(DefaultBodyLimit::max(SETTINGS_BODY_LIMIT)),
        )
        .merge(extension_routes)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(axum::middleware::from_fn_with_state(
            Arc::clone(&state),
            cors,
        ))
        .with_state(state)
}

/// Resolve the MCP client id from headers.
pub fn client_id_from(headers: &HeaderMap) -> String {
    headers
        .get(CLIENT_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or("default")
        .to_string()
}

/// Content-Type must be absent or `application/json` (parameters allowed).
pub fn acceptable_content_type(content_type: Option<&str>) -> bool {
    match content_type {
        None => true,
        Some(value) => value
            .trim()
            .to_ascii_lowercase()
            .starts_with("application/json"),
    }
}

/// `POST /mcp`: JSON-RPC over HTTP.
async fn mcp_endpoint(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    if !acceptable_content_type(content_type) {
        let response = JsonRpcResponse::parse_error(format!(
            "unsupported content type `{}`",
            content_type.unwrap_or_default()
        ));
        return (StatusCode::OK, axum::Json(response)).into_response();
    }

    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            let response = JsonRpcResponse::parse_error(format!("invalid JSON-RPC body: {err}"));
            return (StatusCode::OK, axum::Json(response)).into_response();
        }
    };

    let client_id = client_id_from(&headers);
    tracing::debug!(method = %request.method, client = %client_id, "mcp request");
    match mcp::handle_request(&state, request, &client_id).await {
        Some(response) => (StatusCode::OK, axum::Json(response)).into_response(),
        // Notification: nothing to say, but HTTP needs a status.
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// CORS for localhost origins plus the fixed extension origin.
async fn cors(
    State(state): State<Arc<ServerState>>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let allowed = origin
        .as_deref()
        .is_some_and(|origin| origin_allowed(&state, origin));

    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        if allowed {
            apply_cors_headers(&mut response, origin.as_deref());
        }
        return response;
    }

    let mut response = next.run(request).await;
    if allowed {
        apply_cors_headers(&mut response, origin.as_deref());
    }
    response
}

fn origin_allowed(state: &ServerState, origin: &str) -> bool {
    if origin.starts_with("http://localhost")
        || origin.starts_with("http://127.0.0.1")
        || origin.starts_with("https://localhost")
        || origin.starts_with("https://127.0.0.1")
    {
        return true;
    }
    let settings = state
        .settings
        .read()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    origin == settings.extension_origin
}

fn apply_cors_headers(response: &mut Response, origin: Option<&str>) {
    let Some(origin) = origin else { return };
    let headers = response.headers_mut();
    if let Ok(value) = origin.parse() {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        header::HeaderValue::from_static("GET, POST, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        header::HeaderValue::from_static("content-type, x-gasoline-client, x-gasoline-extension"),
    );
}

/// Gate extension-facing routes on the expected extension header.
async fn extension_only(request: Request, next: Next) -> Response {
    let present = request
        .headers()
        .get(EXTENSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| !value.is_empty());
    if !present {
        return (
            StatusCode::FORBIDDEN,
            axum::Json(serde_json::json!({
                "error": "extension_only",
                "detail": "missing extension header",
            })),
        )
            .into_response();
    }
    next.run(request).await
}

#[cfg(test)]
#[path = "mod.test.rs"]
mod tests;
