use pretty_assertions::assert_eq;
use serde_json::json;

use super::JsonRpcRequest;
use super::JsonRpcResponse;
use super::PARSE_ERROR;
use super::RequestId;

#[test]
fn absent_id_is_notification() {
    let req: JsonRpcRequest =
        serde_json::from_value(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .expect("valid request");
    assert!(req.is_notification());
}

#[test]
fn explicit_null_id_is_a_request() {
    let req: JsonRpcRequest =
        serde_json::from_value(json!({"jsonrpc": "2.0", "id": null, "method": "tools/list"}))
            .expect("valid request");
    assert!(!req.is_notification());
    assert_eq!(req.id, Some(RequestId::Null));
}

#[test]
fn numeric_and_string_ids_roundtrip() {
    let req: JsonRpcRequest =
        serde_json::from_value(json!({"jsonrpc": "2.0", "id": 7, "method": "tools/list"}))
            .expect("valid request");
    assert_eq!(req.id, Some(RequestId::Number(7)));

    let req: JsonRpcRequest =
        serde_json::from_value(json!({"jsonrpc": "2.0", "id": "abc", "method": "tools/list"}))
            .expect("valid request");
    assert_eq!(req.id, Some(RequestId::String("abc".to_string())));
}

#[test]
fn null_id_serializes_as_null() {
    let resp = JsonRpcResponse::parse_error("bad json");
    let value = serde_json::to_value(&resp).expect("serializable");
    assert_eq!(value["id"], json!(null));
    assert_eq!(value["error"]["code"], json!(PARSE_ERROR));
    assert!(value.get("result").is_none());
}

#[test]
fn version_check() {
    let req: JsonRpcRequest =
        serde_json::from_value(json!({"jsonrpc": "1.0", "id": 1, "method": "x"}))
            .expect("structurally valid");
    assert!(!req.has_valid_version());
}

#[test]
fn success_response_omits_error() {
    let resp = JsonRpcResponse::success(RequestId::Number(1), json!({"ok": true}));
    let value = serde_json::to_value(&resp).expect("serializable");
    assert!(value.get("error").is_none());
    assert_eq!(value["result"]["ok"], json!(true));
}
