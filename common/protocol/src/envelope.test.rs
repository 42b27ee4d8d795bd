use pretty_assertions::assert_eq;
use serde_json::json;

use super::ToolResult;

#[test]
fn text_result_serializes_without_optional_fields() {
    let result = ToolResult::text("hello");
    let value = serde_json::to_value(&result).expect("serializable");
    assert_eq!(
        value,
        json!({"content": [{"type": "text", "text": "hello"}]})
    );
}

#[test]
fn metadata_keys_are_inserted_lazily() {
    let mut result = ToolResult::text("x");
    assert!(result.meta("telemetry_changed").is_none());
    result.set_meta("telemetry_changed", json!(true));
    assert_eq!(result.meta("telemetry_changed"), Some(&json!(true)));
}

#[test]
fn is_error_defaults_to_false() {
    let result = ToolResult::text("fine");
    assert!(!result.is_error());

    let value = json!({
        "content": [{"type": "text", "text": "boom"}],
        "isError": true,
    });
    let result: ToolResult = serde_json::from_value(value).expect("deserializable");
    assert!(result.is_error());
}

#[test]
fn push_text_appends_blocks() {
    let mut result = ToolResult::text("primary");
    result.push_text("_warnings: unknown fields: foo");
    assert_eq!(result.content.len(), 2);
    assert_eq!(result.first_text(), Some("primary"));
}
