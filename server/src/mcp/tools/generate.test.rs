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
fn har_entries_are_chronological_and_keep_flags() {
    let state = state();
    state.capture.ingest_network_bodies(vec![
        json!({
            "method": "GET", "url": "http://api/first", "status": 200,
            "timestamp": 1_700_000_000_000i64,
        }),
        json!({
            "method": "POST", "url": "http://api/second", "status": 201,
            "request_body": "x".repeat(10),
            "request_truncated": true,
            "timestamp": 1_700_000_001_000i64,
        }),
    ]);

    let result = handle(&state, "har", &args(json!({"what": "har"})));
    let har = body_of(&result);
    let entries = har["log"]["entries"].as_array().expect("entries");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["request"]["url"], json!("http://api/first"));
    assert_eq!(entries[1]["request"]["method"], json!("POST"));
    assert_eq!(entries[1]["_requestTruncated"], json!(true));
    assert_eq!(entries[0]["_requestTruncated"], json!(false));

    // Round-trip: the document survives serialization without losing the
    // method/url/status/truncation fields.
    let reparsed: Value =
        serde_json::from_str(&har.to_string()).expect("round-trips");
    assert_eq!(reparsed["log"]["entries"][1]["response"]["status"], json!(201));
}

#[test]
fn har_save_rejects_disallowed_paths() {
    let state = state();
    let result = handle(
        &state,
        "har",
        &args(json!({"what": "har", "path": "/etc/evil.har"})),
    );
    assert!(result.is_error());
    assert_eq!(body_of(&result)["error_code"], json!("path_not_allowed"));
}

#[test]
fn har_save_writes_under_tmp() {
    let state = state();
    state.capture.ingest_network_bodies(vec![
        json!({"method": "GET", "url": "http://api/x", "status": 200}),
    ]);
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out.har");
    let path_str = path.to_str().expect("utf8");

    let result = handle(&state, "har", &args(json!({"what": "har", "path": path_str})));
    assert!(!result.is_error(), "tempdir path should be allowed");
    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("file")).expect("json");
    assert_eq!(written["log"]["version"], json!("1.2"));
}

#[test]
fn summary_mentions_counts_and_errors() {
    let state = state();
    state.capture.ingest_logs(vec![
        json!({"level": "error", "message": "db exploded"}),
    ]);
    let result = handle(&state, "summary", &args(json!({"what": "summary"})));
    let text = result.first_text().expect("text");
    assert!(text.contains("logs: 1 captured"));
    assert!(text.contains("db exploded"));
}
