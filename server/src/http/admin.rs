//! Health, doctor, diagnostics, client, and telemetry routes.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Deserialize;
use serde_json::json;

use gasoline_protocol::BufferKind;

use crate::VERSION;
use crate::doctor;
use crate::settings;
use crate::state::ServerState;

/// `GET /health` — the cheap liveness view.
pub async fn health(State(state): State<Arc<ServerState>>) -> Response {
    Json(json!({
        "status": "ok",
        "version": VERSION,
        "port": state.port,
        "uptime_ms": state.uptime().as_millis() as u64,
        "extension_connected": state.extension_connected(),
        "circuit_open": state.breaker.is_open(),
    }))
    .into_response()
}

/// `GET /doctor` — the full readiness battery.
pub async fn doctor(State(state): State<Arc<ServerState>>) -> Response {
    Json(doctor::run_checks(&state, true)).into_response()
}

/// `GET /diagnostics(.json)` — a self-describing dump for bug reports.
pub async fn diagnostics(State(state): State<Arc<ServerState>>) -> Response {
    Json(json!({
        "version": VERSION,
        "uptime_ms": state.uptime().as_millis() as u64,
        "buffers": {
            "total_written": state.capture.counts(),
            "buffered": state.capture.lengths(),
            "dropped": state.capture.dropped(),
        },
        "queue_depth": state.queue.depth(),
        "circuit": state.breaker.snapshot(),
        "clients": state.clients.list(),
        "annotation_sessions": state.annotations.session_count(),
        "tracked_tab": state.tracked_tab(),
        "security_mode": state.security_mode(),
    }))
    .into_response()
}

/// `POST /shutdown` — ask the daemon to exit gracefully.
pub async fn shutdown(State(state): State<Arc<ServerState>>) -> Response {
    tracing::info!("shutdown requested over http");
    state.shutdown.cancel();
    Json(json!({"shutting_down": true})).into_response()
}

pub async fn list_clients(State(state): State<Arc<ServerState>>) -> Response {
    Json(json!({"clients": state.clients.list()})).into_response()
}

#[derive(Debug, Deserialize)]
struct RegisterClient {
    client_id: String,
    #[serde(default)]
    cwd: Option<String>,
}

pub async fn register_client(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> Response {
    let request: RegisterClient = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "invalid_json", "detail": err.to_string()})),
            )
                .into_response();
        }
    };
    state.clients.touch(&request.client_id, request.cwd);
    match state.clients.get(&request.client_id) {
        Some(record) => Json(json!({"client": record})).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

pub async fn get_client(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Response {
    match state.clients.get(&id) {
        Some(record) => Json(json!({"client": record})).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "unknown_client", "client_id": id})),
        )
            .into_response(),
    }
}

pub async fn remove_client(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Response {
    if state.clients.remove(&id) {
        Json(json!({"removed": id})).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "unknown_client", "client_id": id})),
        )
            .into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct TelemetryParams {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// `GET /telemetry?type=…&limit=N` — the unified read endpoint.
pub async fn telemetry(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<TelemetryParams>,
) -> Response {
    let Some(kind) = BufferKind::parse(&params.kind) else {
        let valid: Vec<&str> = BufferKind::ALL.iter().map(BufferKind::as_str).collect();
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "unknown_type", "valid": valid})),
        )
            .into_response();
    };
    let limit = params.limit.unwrap_or(100).min(1000);
    let entries = state.capture.read_raw(kind, limit);
    Json(json!({
        "type": kind.as_str(),
        "count": entries.len(),
        "entries": entries,
        "dropped": state.capture.dropped().get(kind),
    }))
    .into_response()
}

#[derive(Debug, Deserialize)]
struct SettingsBody {
    #[serde(default)]
    ai_web_pilot_enabled: Option<bool>,
}

/// `POST /settings` — pilot toggle, persisted to the cached-settings file.
pub async fn update_settings(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> Response {
    let request: SettingsBody = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "invalid_json", "detail": err.to_string()})),
            )
                .into_response();
        }
    };
    if let Some(enabled) = request.ai_web_pilot_enabled {
        state
            .pilot_enabled
            .store(enabled, std::sync::atomic::Ordering::Relaxed);
    }
    let enabled = state
        .pilot_enabled
        .load(std::sync::atomic::Ordering::Relaxed);
    if let Err(err) = settings::store(&state.state_dir, enabled) {
        tracing::warn!("failed to persist cached settings: {err}");
    }
    Json(json!({"ai_web_pilot_enabled": enabled})).into_response()
}

/// `GET /openapi.json` — a static description of the extension surface.
pub async fn openapi(State(state): State<Arc<ServerState>>) -> Response {
    let port = state.port;
    Json(json!({
        "openapi": "3.0.0",
        "info": {"title": "gasoline daemon", "version": VERSION},
        "servers": [{"url": format!("http://127.0.0.1:{port}")}],
        "paths": {
            "/mcp": {"post": {"summary": "MCP JSON-RPC endpoint"}},
            "/health": {"get": {"summary": "Liveness"}},
            "/doctor": {"get": {"summary": "Readiness battery"}},
            "/telemetry": {"get": {"summary": "Unified telemetry read"}},
            "/logs": {"post": {"summary": "Ingest console logs"}},
            "/network-bodies": {"post": {"summary": "Ingest request/response bodies"}},
            "/network-waterfall": {"post": {"summary": "Ingest waterfall timings"}},
            "/websocket-events": {"post": {"summary": "Ingest WebSocket events"}},
            "/websocket-status": {"post": {"summary": "Ingest WebSocket status"}},
            "/enhanced-actions": {"post": {"summary": "Ingest user actions"}},
            "/performance-snapshots": {"post": {"summary": "Ingest performance frames"}},
            "/sync": {"post": {"summary": "Aggregated ingestion + command pickup"}},
            "/query-result": {"post": {"summary": "Command result delivery"}},
            "/screenshots": {"post": {"summary": "Screenshot intake"}},
            "/draw-mode/complete": {"post": {"summary": "Draw session delivery"}},
        },
    }))
    .into_response()
}

/// `GET /` — a minimal status page.
pub async fn dashboard(State(state): State<Arc<ServerState>>) -> Response {
    let connected = if state.extension_connected() {
        "connected"
    } else {
        "not connected"
    };
    let circuit = if state.breaker.is_open() {
        "open"
    } else {
        "closed"
    };
    let html = format!(
        "<!doctype html><html><head><title>gasoline</title></head><body>\
         <h1>gasoline daemon</h1>\
         <p>version {VERSION} on port {}</p>\
         <ul>\
         <li>extension: {connected}</li>\
         <li>circuit: {circuit}</li>\
         <li>queue depth: {}</li>\
         </ul>\
         <p>See <a href=\"/doctor\">/doctor</a> and \
         <a href=\"/diagnostics\">/diagnostics</a>.</p>\
         </body></html>",
        state.port,
        state.queue.depth(),
    );
    Html(html).into_response()
}

#[cfg(test)]
#[path = "admin.test.rs"]
mod tests;
