use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::Value;
use serde_json::json;

use gasoline_protocol::BufferKind;

use super::batch_from;
use super::ingest_common;
use crate::state::ServerState;

fn state() -> std::sync::Arc<ServerState> {
    ServerState::new(std::env::temp_dir().join("gasoline-test"), 0)
}

#[test]
fn batch_from_accepts_arrays_wrappers_and_singles() {
    assert_eq!(batch_from(json!([1, 2])).len(), 2);
    assert_eq!(batch_from(json!({"entries": [1, 2, 3]})).len(), 3);

    let single = batch_from(json!({"level": "info", "message": "x"}));
    assert_eq!(single.len(), 1);
    assert_eq!(single[0]["level"], json!("info"));
}

#[test]
fn ingest_writes_to_the_buffer_and_counts_events() {
    let state = state();
    let body = serde_json::to_vec(&json!([
        {"level": "error", "message": "a"},
        {"level": "info", "message": "b"},
    ]))
    .expect("serializable");

    let response = ingest_common(&state, BufferKind::Logs, &body);
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.capture.counts().logs, 2);
}

#[test]
fn malformed_body_is_bad_request() {
    let state = state();
    let response = ingest_common(&state, BufferKind::Logs, b"not json");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(state.capture.counts().logs, 0);
}

#[test]
fn open_circuit_rejects_with_503() {
    let state = state();
    // Trip the breaker (default config: 3-window streak).
    let t0 = std::time::Instant::now();
    for n in 0..4u64 {
        state
            .breaker
            .record_events_at(1500, t0 + std::time::Duration::from_secs(n));
    }
    assert!(state.breaker.is_open());

    let body = serde_json::to_vec(&json!([{"level": "info", "message": "x"}]))
        .expect("serializable");
    let response = ingest_common(&state, BufferKind::Logs, &body);
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    // Nothing was buffered.
    assert_eq!(state.capture.counts().logs, 0);
}

#[test]
fn bad_entries_do_not_stop_a_batch() {
    let state = state();
    let body = serde_json::to_vec(&json!({
        "entries": [
            {"level": "error", "message": "good"},
            {"message": "missing level"},
        ]
    }))
    .expect("serializable");

    let response = ingest_common(&state, BufferKind::Logs, &body);
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.capture.counts().logs, 1);
}

#[test]
fn single_object_wrapped_value_is_preserved() {
    let raw: Value = json!({"entries": {"level": "warn", "message": "solo"}});
    let batch = batch_from(raw);
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0]["message"], json!("solo"));
}
