use pretty_assertions::assert_eq;
use serde_json::json;

use gasoline_protocol::ToolErrorCode;

use super::Args;
use super::limit_arg;
use super::unknown_field_warning;
use super::validate_selector;

fn args(value: serde_json::Value) -> Args {
    value.as_object().expect("object").clone()
}

#[test]
fn plain_selectors_pass() {
    assert!(validate_selector("#submit").is_ok());
    assert!(validate_selector("div.card > button[data-id='x']").is_ok());
}

#[test]
fn injection_selectors_are_rejected() {
    for bad in ["<script>alert(1)</script>", "a[href=javascript:void(0)]", "x\ny"] {
        let err = validate_selector(bad).expect_err("should reject");
        assert_eq!(err.error_code, ToolErrorCode::SelectorInjectionDetected);
    }
}

#[test]
fn oversized_selectors_are_rejected() {
    assert!(validate_selector(&"a".repeat(1001)).is_err());
}

#[test]
fn limit_defaults_and_caps() {
    assert_eq!(limit_arg(&args(json!({}))), 50);
    assert_eq!(limit_arg(&args(json!({"limit": 10}))), 10);
    assert_eq!(limit_arg(&args(json!({"limit": 99999}))), 1000);
}

#[test]
fn unknown_fields_are_listed_sorted() {
    let warning = unknown_field_warning(
        "observe",
        &args(json!({"what": "errors", "zebra": 1, "alpha": 2, "limit": 5})),
        &["limit"],
    )
    .expect("warning");
    assert_eq!(warning, "_warnings: unknown fields: alpha, zebra");
}

#[test]
fn dispatch_aliases_and_common_args_are_not_unknown() {
    assert!(unknown_field_warning(
        "configure",
        &args(json!({"action": "clear", "buffer": "circuit", "telemetry_mode": "off"})),
        &["buffer"],
    )
    .is_none());
}
