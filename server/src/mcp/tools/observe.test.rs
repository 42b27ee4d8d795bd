use pretty_assertions::assert_eq;
use serde_json::Value;
use serde_json::json;

use super::super::Args;
use super::handle;
use crate::state::ServerState;

fn args(value: serde_json::Value) -> Args {
    value.as_object().expect("object").clone()
}

fn state() -> std::sync::Arc<ServerState> {
    ServerState::new(std::env::temp_dir().join("gasoline-test"), 0)
}

fn body_of(result: &gasoline_protocol::ToolResult) -> Value {
    serde_json::from_str(result.first_text().expect("text")).expect("json body")
}

#[test]
fn errors_mode_returns_only_error_entries() {
    let state = state();
    state.capture.ingest_logs(vec![
        json!({"level": "error", "message": "boom"}),
        json!({"level": "info", "message": "fine"}),
        json!({"level": "error", "message": "bang"}),
    ]);

    let result = handle(&state, "errors", &args(json!({"what": "errors"})));
    let body = body_of(&result);
    assert_eq!(body["count"], json!(2));
    assert_eq!(body["entries"][0]["message"], json!("bang"));
}

#[test]
fn network_mode_applies_filters() {
    let state = state();
    state.capture.ingest_network_bodies(vec![
        json!({"method": "GET", "url": "http://api/a", "status": 200}),
        json!({"method": "GET", "url": "http://api/b", "status": 500}),
    ]);

    let result = handle(
        &state,
        "network",
        &args(json!({"what": "network", "status_min": 400})),
    );
    let body = body_of(&result);
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["entries"][0]["url"], json!("http://api/b"));
}

#[test]
fn summary_mode_reports_queue_and_circuit() {
    let state = state();
    let result = handle(&state, "summary", &args(json!({"what": "summary"})));
    let body = body_of(&result);
    assert_eq!(body["queue_depth"], json!(0));
    assert_eq!(body["circuit"]["circuit_open"], json!(false));
    assert_eq!(body["extension_connected"], json!(false));
}

#[test]
fn empty_buffers_return_empty_entries() {
    let state = state();
    let result = handle(&state, "actions", &args(json!({"what": "actions"})));
    let body = body_of(&result);
    assert_eq!(body["count"], json!(0));
    assert!(body["entries"].as_array().expect("array").is_empty());
    assert!(!result.is_error());
}
