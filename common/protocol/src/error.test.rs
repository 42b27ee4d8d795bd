use pretty_assertions::assert_eq;
use serde_json::Value;
use serde_json::json;

use super::ToolError;
use super::ToolErrorCode;
use super::recovery_plan;

#[test]
fn codes_serialize_snake_case() {
    assert_eq!(
        serde_json::to_value(ToolErrorCode::SelectorInjectionDetected).expect("serializable"),
        json!("selector_injection_detected")
    );
    assert_eq!(ToolErrorCode::Timeout.as_ref(), "timeout");
}

#[test]
fn into_result_produces_error_envelope() {
    let result = ToolError::new(ToolErrorCode::Timeout, "command timed out", "retry once")
        .into_result();
    assert!(result.is_error());

    let body: Value =
        serde_json::from_str(result.first_text().expect("has text")).expect("valid json");
    assert_eq!(body["error_code"], json!("timeout"));
    assert_eq!(body["message"], json!("command timed out"));
    assert_eq!(body["retry_guidance"], json!("retry once"));
    assert!(body["recovery_plan"]["ordered_recovery_steps"].is_array());
    assert_eq!(result.meta("error_code"), Some(&json!("timeout")));
}

#[test]
fn missing_param_names_the_parameter() {
    let err = ToolError::missing_param("selector");
    assert_eq!(err.error_code, ToolErrorCode::MissingParam);
    assert_eq!(err.param.as_deref(), Some("selector"));
}

#[test]
fn invalid_param_lists_valid_values() {
    let err = ToolError::invalid_param("what", &["errors", "logs"]);
    assert!(err.message.contains("errors, logs"));
}

#[test]
fn playbooks_exist_only_for_known_codes() {
    assert!(recovery_plan(ToolErrorCode::Timeout).is_some());
    assert!(recovery_plan(ToolErrorCode::Expired).is_some());
    assert!(recovery_plan(ToolErrorCode::ElementNotFound).is_some());
    assert!(recovery_plan(ToolErrorCode::MissingParam).is_none());
    assert!(recovery_plan(ToolErrorCode::InvalidJson).is_none());
}

#[test]
fn hint_is_omitted_when_absent() {
    let err = ToolError::new(ToolErrorCode::InvalidJson, "bad body", "send valid json");
    let value = serde_json::to_value(&err).expect("serializable");
    assert!(value.get("hint").is_none());
    assert!(value.get("param").is_none());
}
