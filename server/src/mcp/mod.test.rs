use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::Value;
use serde_json::json;

use gasoline_protocol::JsonRpcRequest;
use gasoline_protocol::RequestId;
use gasoline_protocol::ToolResult;
use gasoline_protocol::jsonrpc::INVALID_PARAMS;
use gasoline_protocol::jsonrpc::INVALID_REQUEST;
use gasoline_protocol::jsonrpc::METHOD_NOT_FOUND;

use super::handle_request;
use crate::state::ServerState;

fn state() -> Arc<ServerState> {
    ServerState::new(std::env::temp_dir().join("gasoline-test"), 0)
}

fn request(value: Value) -> JsonRpcRequest {
    serde_json::from_value(value).expect("valid request")
}

async fn roundtrip(state: &Arc<ServerState>, value: Value) -> Option<Value> {
    handle_request(state, request(value), "cli-1")
        .await
        .map(|resp| serde_json::to_value(resp).expect("serializable"))
}

#[tokio::test]
async fn wrong_version_is_invalid_request() {
    let state = state();
    let resp = roundtrip(&state, json!({"jsonrpc": "1.0", "id": 1, "method": "tools/list"}))
        .await
        .expect("response");
    assert_eq!(resp["error"]["code"], json!(INVALID_REQUEST));
}

#[tokio::test]
async fn notifications_get_no_response() {
    let state = state();
    assert!(
        roundtrip(
            &state,
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"})
        )
        .await
        .is_none()
    );
    // Unknown notification methods are also silent.
    assert!(
        roundtrip(
            &state,
            json!({"jsonrpc": "2.0", "method": "notifications/whatever"})
        )
        .await
        .is_none()
    );
}

#[tokio::test]
async fn explicit_null_id_gets_null_id_response() {
    let state = state();
    let resp = roundtrip(
        &state,
        json!({"jsonrpc": "2.0", "id": null, "method": "tools/list"}),
    )
    .await
    .expect("null id is a request");
    assert_eq!(resp["id"], json!(null));
    assert!(resp["result"]["tools"].is_array());
}

#[tokio::test]
async fn initialize_echoes_known_version_and_replaces_unknown() {
    let state = state();
    let resp = roundtrip(
        &state,
        json!({
            "jsonrpc": "2.0", "id": 1, "method": "initialize",
            "params": {"protocolVersion": "2024-11-05"},
        }),
    )
    .await
    .expect("response");
    assert_eq!(resp["result"]["protocolVersion"], json!("2024-11-05"));

    let resp = roundtrip(
        &state,
        json!({
            "jsonrpc": "2.0", "id": 2, "method": "initialize",
            "params": {"protocolVersion": "1990-01-01"},
        }),
    )
    .await
    .expect("response");
    assert_eq!(resp["result"]["protocolVersion"], json!("2025-06-18"));
    assert_eq!(resp["result"]["serverInfo"]["name"], json!("gasoline"));
}

#[tokio::test]
async fn tools_list_advertises_the_five_tools() {
    let state = state();
    let resp = roundtrip(&state, json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
        .await
        .expect("response");
    let tools = resp["result"]["tools"].as_array().expect("array");
    assert_eq!(tools.len(), 5);
}

#[tokio::test]
async fn unknown_method_is_method_not_found() {
    let state = state();
    let resp = roundtrip(&state, json!({"jsonrpc": "2.0", "id": 1, "method": "bogus/method"}))
        .await
        .expect("response");
    assert_eq!(resp["error"]["code"], json!(METHOD_NOT_FOUND));
}

#[tokio::test]
async fn unknown_tool_is_a_jsonrpc_error() {
    let state = state();
    let resp = roundtrip(
        &state,
        json!({
            "jsonrpc": "2.0", "id": 1, "method": "tools/call",
            "params": {"name": "hack", "arguments": {}},
        }),
    )
    .await
    .expect("response");
    assert_eq!(resp["error"]["code"], json!(INVALID_PARAMS));
}

#[tokio::test]
async fn unknown_what_is_a_structured_tool_error() {
    let state = state();
    let resp = roundtrip(
        &state,
        json!({
            "jsonrpc": "2.0", "id": 1, "method": "tools/call",
            "params": {"name": "observe", "arguments": {"what": "vibes"}},
        }),
    )
    .await
    .expect("response");
    // Tool-level failure: a result envelope, not a JSON-RPC error.
    assert!(resp.get("error").is_none());
    let result: ToolResult =
        serde_json::from_value(resp["result"].clone()).expect("tool result");
    assert!(result.is_error());
    let body: Value =
        serde_json::from_str(result.first_text().expect("text")).expect("body");
    assert_eq!(body["error_code"], json!("invalid_param"));
    assert!(body["message"].as_str().expect("msg").contains("errors"));
}

#[tokio::test]
async fn observe_errors_end_to_end_with_telemetry_deltas() {
    let state = state();
    for n in 0..3 {
        state.capture.ingest_logs(vec![
            json!({"level": "error", "message": format!("failure {n}")}),
        ]);
    }

    let call = json!({
        "jsonrpc": "2.0", "id": 1, "method": "tools/call",
        "params": {"name": "observe", "arguments": {"what": "errors"}},
    });
    let resp = roundtrip(&state, call.clone()).await.expect("response");
    let result: ToolResult =
        serde_json::from_value(resp["result"].clone()).expect("tool result");
    let body: Value =
        serde_json::from_str(result.first_text().expect("text")).expect("body");
    assert_eq!(body["entries"].as_array().expect("entries").len(), 3);
    assert_eq!(result.meta("telemetry_changed"), Some(&json!(true)));

    // Second identical call: nothing new, auto mode omits the summary.
    let resp = roundtrip(&state, call).await.expect("response");
    let result: ToolResult =
        serde_json::from_value(resp["result"].clone()).expect("tool result");
    assert_eq!(result.meta("telemetry_changed"), Some(&json!(false)));
    assert!(result.meta("telemetry_summary").is_none());
}

#[tokio::test]
async fn unknown_argument_fields_warn_without_failing() {
    let state = state();
    let resp = roundtrip(
        &state,
        json!({
            "jsonrpc": "2.0", "id": 1, "method": "tools/call",
            "params": {"name": "observe", "arguments": {"what": "errors", "bogus_flag": true}},
        }),
    )
    .await
    .expect("response");
    let result: ToolResult =
        serde_json::from_value(resp["result"].clone()).expect("tool result");
    assert!(!result.is_error());
    assert!(
        result
            .content
            .iter()
            .any(|block| block.text.contains("_warnings: unknown fields: bogus_flag"))
    );
}

#[tokio::test]
async fn tools_call_as_notification_executes_silently() {
    let state = state();
    let none = handle_request(
        &state,
        request(json!({
            "jsonrpc": "2.0", "method": "tools/call",
            "params": {"name": "configure", "arguments": {"what": "telemetry", "mode": "off"}},
        })),
        "cli-1",
    )
    .await;
    assert!(none.is_none());
    // The call still took effect.
    assert_eq!(
        state.telemetry_default(),
        gasoline_protocol::TelemetryMode::Off
    );
}

#[tokio::test]
async fn numeric_ids_round_trip() {
    let state = state();
    let resp = handle_request(
        &state,
        request(json!({"jsonrpc": "2.0", "id": 42, "method": "tools/list"})),
        "cli-1",
    )
    .await
    .expect("response");
    assert_eq!(resp.id, RequestId::Number(42));
}
