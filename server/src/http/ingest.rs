//! Extension ingestion routes.
//!
//! Telemetry batches land in the capture buffers; every observed event
//! feeds the rate-limit window. While the circuit is open, ingestion
//! rejects with a 503 envelope and MCP reads continue untouched.

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use axum::Json;
use axum::body::Bytes;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use gasoline_protocol::Alert;
use gasoline_protocol::AlertSeverity;
use gasoline_protocol::AnnotationDetail;
use gasoline_protocol::AnnotationSession;
use gasoline_protocol::BufferKind;
use gasoline_protocol::CommandResult;

use crate::http::client_id_from;
use crate::state::ServerState;
use crate::state::TrackedTab;

pub async fn logs(state: State<Arc<ServerState>>, body: Bytes) -> Response {
    ingest_common(&state, BufferKind::Logs, &body)
}

pub async fn network_bodies(state: State<Arc<ServerState>>, body: Bytes) -> Response {
    ingest_common(&state, BufferKind::NetworkBodies, &body)
}

pub async fn network_waterfall(state: State<Arc<ServerState>>, body: Bytes) -> Response {
    ingest_common(&state, BufferKind::NetworkWaterfall, &body)
}

pub async fn websocket_events(state: State<Arc<ServerState>>, body: Bytes) -> Response {
    ingest_common(&state, BufferKind::WebsocketEvents, &body)
}

pub async fn websocket_status(state: State<Arc<ServerState>>, body: Bytes) -> Response {
    ingest_common(&state, BufferKind::WebsocketStatus, &body)
}

pub async fn enhanced_actions(state: State<Arc<ServerState>>, body: Bytes) -> Response {
    ingest_common(&state, BufferKind::Actions, &body)
}

pub async fn performance_snapshots(state: State<Arc<ServerState>>, body: Bytes) -> Response {
    ingest_common(&state, BufferKind::PerformanceSnapshots, &body)
}

fn ingest_common(state: &ServerState, kind: BufferKind, body: &[u8]) -> Response {
    if let Some(rejection) = circuit_rejection(state) {
        return rejection;
    }
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "invalid_json", "detail": err.to_string()})),
            )
                .into_response();
        }
    };
    let batch = batch_from(value);
    let observed = batch.len() as u64;
    if kind == BufferKind::Logs {
        emit_error_alerts(state, &batch);
    }
    let outcome = state.capture.ingest_kind(kind, batch);
    state.breaker.record_events(observed);
    Json(json!({"accepted": outcome.accepted, "rejected": outcome.rejected})).into_response()
}

/// Error-level console lines feed the streaming-alert emitter.
fn emit_error_alerts(state: &ServerState, batch: &[Value]) {
    for entry in batch {
        if entry.get("level").and_then(Value::as_str) != Some("error") {
            continue;
        }
        let message = entry
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("console error");
        state.alerts.emit(Alert::new(
            "console_error",
            AlertSeverity::Error,
            message,
        ));
    }
}

/// Accept a bare array, an `{"entries": [...]}` wrapper, or a single
/// object.
fn batch_from(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("entries") {
            Some(Value::Array(items)) => items,
            Some(other) => vec![other],
            None => vec![Value::Object(map)],
        },
        other => vec![other],
    }
}

fn circuit_rejection(state: &ServerState) -> Option<Response> {
    if !state.breaker.is_open() {
        return None;
    }
    let snapshot = state.breaker.snapshot();
    Some(
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": "circuit_open",
                "reason": snapshot.reason,
                "retry_after_ms": 1000,
            })),
        )
            .into_response(),
    )
}

/// The universal command-result route: the extension posts back the result
/// tagged with its correlation id.
pub async fn query_result(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> Response {
    state.record_extension_poll();
    let result: CommandResult = match serde_json::from_slice(&body) {
        Ok(result) => result,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "invalid_json", "detail": err.to_string()})),
            )
                .into_response();
        }
    };

    // A CSP blockage reported alongside a result feeds the response
    // post-processor's hint.
    if let Some(blocked) = result.payload.get("csp_blocked") {
        if blocked.as_bool() == Some(true) || blocked.is_string() {
            let note = blocked
                .as_str()
                .unwrap_or("content security policy blocked script execution")
                .to_string();
            state.set_csp_note(Some(note));
        }
    }

    state.queue.complete(result);
    Json(json!({"ok": true})).into_response()
}

/// Keys the aggregated `/sync` envelope may carry, mapped to buffer kinds.
const SYNC_KINDS: [(&str, BufferKind); 8] = [
    ("logs", BufferKind::Logs),
    ("network_bodies", BufferKind::NetworkBodies),
    ("network_waterfall", BufferKind::NetworkWaterfall),
    ("websocket_events", BufferKind::WebsocketEvents),
    ("websocket_status", BufferKind::WebsocketStatus),
    ("actions", BufferKind::Actions),
    ("performance_snapshots", BufferKind::PerformanceSnapshots),
    ("extension_logs", BufferKind::ExtensionLogs),
];

/// Aggregated ingestion: several kinds in one POST, plus pending commands
/// in the response so the extension saves a round trip.
pub async fn sync(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.record_extension_poll();
    if let Some(rejection) = circuit_rejection(&state) {
        return rejection;
    }
    let mut envelope: serde_json::Map<String, Value> = match serde_json::from_slice(&body) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "invalid_json", "detail": "expected an object"})),
            )
                .into_response();
        }
    };

    if let Some(tab) = envelope.remove("tracked_tab") {
        if let Ok(tab) = serde_json::from_value::<TrackedTab>(tab) {
            state.set_tracked_tab(Some(tab));
        }
    }

    let mut accepted = serde_json::Map::new();
    let mut observed = 0u64;
    for (key, kind) in SYNC_KINDS {
        let Some(Value::Array(items)) = envelope.remove(key) else {
            continue;
        };
        observed += items.len() as u64;
        if kind == BufferKind::Logs {
            emit_error_alerts(&state, &items);
        }
        let outcome = state.capture.ingest_kind(kind, items);
        accepted.insert(key.to_string(), json!(outcome));
    }
    state.breaker.record_events(observed);

    let client_id = client_id_from(&headers);
    let mut commands = Vec::new();
    while commands.len() < 10 {
        match state.queue.take_next(&client_id) {
            Some(command) => commands.push(command),
            None => break,
        }
    }

    Json(json!({"accepted": accepted, "commands": commands})).into_response()
}

#[derive(Debug, Deserialize)]
pub struct PollParams {
    #[serde(default)]
    pub wait_ms: Option<u64>,
}

/// Extension long-poll for pending commands.
pub async fn poll_commands(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Query(params): Query<PollParams>,
) -> Response {
    let client_id = client_id_from(&headers);
    let deadline = Instant::now() + Duration::from_millis(params.wait_ms.unwrap_or(10_000).min(25_000));
    loop {
        state.record_extension_poll();
        if let Some(command) = state.queue.take_next(&client_id) {
            return Json(json!({"command": command})).into_response();
        }
        if Instant::now() >= deadline || state.shutdown.is_cancelled() {
            return Json(json!({"command": Value::Null})).into_response();
        }
        tokio::time::sleep(Duration::from_millis(150)).await;
    }
}

#[derive(Debug, Deserialize)]
struct DrawComplete {
    session: AnnotationSession,
    #[serde(default)]
    details: Vec<AnnotationDetail>,
    #[serde(default)]
    name: Option<String>,
}

/// Draw-mode completion: the extension delivers the finished session plus
/// per-annotation DOM details.
pub async fn draw_mode_complete(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> Response {
    state.record_extension_poll();
    // Either a `{session, details?, name?}` wrapper or a bare session.
    let parsed: Result<DrawComplete, _> = serde_json::from_slice(&body);
    let complete = match parsed {
        Ok(complete) => complete,
        Err(_) => match serde_json::from_slice::<AnnotationSession>(&body) {
            Ok(session) => DrawComplete {
                session,
                details: Vec::new(),
                name: None,
            },
            Err(err) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "invalid_json", "detail": err.to_string()})),
                )
                    .into_response();
            }
        },
    };

    let tab_id = complete.session.tab_id.clone();
    for detail in complete.details {
        state.annotations.store_detail(detail);
    }
    if let Some(name) = &complete.name {
        state
            .annotations
            .append_to_named_session(name, complete.session.clone());
    }
    state.annotations.store_session(complete.session);
    Json(json!({"ok": true, "tab_id": tab_id})).into_response()
}

#[cfg(test)]
#[path = "ingest.test.rs"]
mod tests;
