use pretty_assertions::assert_eq;
use serde_json::json;

use gasoline_protocol::BufferKind;

use super::BufferCaps;
use super::CaptureStore;
use super::NetworkFilter;

fn small_caps() -> BufferCaps {
    BufferCaps {
        logs: 3,
        network_bodies: 4,
        network_waterfall: 4,
        websocket_events: 4,
        websocket_status: 2,
        actions: 4,
        performance_snapshots: 2,
        extension_logs: 2,
    }
}

#[test]
fn log_batch_keeps_going_past_bad_entries() {
    let store = CaptureStore::new();
    let outcome = store.ingest_logs(vec![
        json!({"level": "error", "message": "a"}),
        json!({"message": "no level"}),
        json!({"level": "info", "message": "b"}),
    ]);
    assert_eq!(outcome.accepted, 2);
    assert_eq!(outcome.rejected, 1);
    assert_eq!(store.recent_logs(0, None).len(), 2);
}

#[test]
fn reads_are_newest_first_and_level_filtered() {
    let store = CaptureStore::new();
    store.ingest_logs(vec![
        json!({"level": "error", "message": "first"}),
        json!({"level": "info", "message": "second"}),
        json!({"level": "error", "message": "third"}),
    ]);
    let errors = store.error_logs(0);
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].message, "third");
    assert_eq!(errors[1].message, "first");
}

#[test]
fn overflow_drops_oldest_and_counts() {
    let store = CaptureStore::with_caps(small_caps());
    for n in 0..5 {
        store.ingest_logs(vec![json!({"level": "info", "message": format!("m{n}")})]);
    }
    let logs = store.recent_logs(0, None);
    assert_eq!(logs.len(), 3);
    assert_eq!(logs[0].message, "m4");
    assert_eq!(store.dropped().logs, 2);
    assert_eq!(store.counts().logs, 5);
}

#[test]
fn network_filter_applies_on_snapshot() {
    let store = CaptureStore::new();
    store.ingest_network_bodies(vec![
        json!({"method": "GET", "url": "http://api/users", "status": 200}),
        json!({"method": "POST", "url": "http://api/users", "status": 500,
               "response_body": "{\"error\":\"db down\"}"}),
        json!({"method": "GET", "url": "http://cdn/app.js", "status": 200}),
    ]);

    let filter = NetworkFilter {
        url_contains: Some("api".to_string()),
        ..NetworkFilter::default()
    };
    assert_eq!(store.recent_network_bodies(0, &filter).len(), 2);

    let filter = NetworkFilter {
        status_min: Some(500),
        ..NetworkFilter::default()
    };
    let failures = store.recent_network_bodies(0, &filter);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].method, "POST");

    let filter = NetworkFilter {
        body_contains: Some("db down".to_string()),
        ..NetworkFilter::default()
    };
    assert_eq!(store.recent_network_bodies(0, &filter).len(), 1);
}

#[test]
fn chronological_read_preserves_insertion_order() {
    let store = CaptureStore::new();
    store.ingest_network_bodies(vec![
        json!({"method": "GET", "url": "http://a", "status": 200}),
        json!({"method": "GET", "url": "http://b", "status": 200}),
    ]);
    let bodies = store.chronological_network_bodies();
    assert_eq!(bodies[0].url, "http://a");
    assert_eq!(bodies[1].url, "http://b");
}

#[test]
fn ingest_kind_routes_by_buffer() {
    let store = CaptureStore::new();
    let outcome = store.ingest_kind(
        BufferKind::WebsocketEvents,
        vec![json!({"connection_id": "c1", "direction": "sent", "event": "message"})],
    );
    assert_eq!(outcome.accepted, 1);
    assert_eq!(store.recent_websocket_events(0, Some("c1")).len(), 1);
    assert_eq!(store.recent_websocket_events(0, Some("c2")).len(), 0);
}

#[test]
fn read_raw_serves_every_kind() {
    let store = CaptureStore::new();
    store.ingest_actions(vec![json!({"type": "click", "selectors": ["#go"]})]);
    let raw = store.read_raw(BufferKind::Actions, 10);
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0]["type"], json!("click"));
    assert!(store.read_raw(BufferKind::PerformanceSnapshots, 10).is_empty());
}

#[test]
fn clear_empties_without_resetting_cursor_basis() {
    let store = CaptureStore::new();
    store.ingest_logs(vec![json!({"level": "info", "message": "x"})]);
    store.clear(BufferKind::Logs);
    assert!(store.recent_logs(0, None).is_empty());
    assert_eq!(store.counts().logs, 1);
}
