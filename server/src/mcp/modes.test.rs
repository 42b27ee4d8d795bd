use pretty_assertions::assert_eq;
use serde_json::json;

use super::dispatch_mode;
use super::modes_for;

fn args(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value.as_object().expect("object").clone()
}

#[test]
fn every_tool_has_modes() {
    for tool in super::TOOLS {
        assert!(modes_for(tool).is_some_and(|modes| !modes.is_empty()));
    }
    assert!(modes_for("unknown").is_none());
}

#[test]
fn what_is_the_primary_dispatch_key() {
    let mode = dispatch_mode("observe", &args(json!({"what": "errors"})));
    assert_eq!(mode.as_deref(), Some("errors"));
}

#[test]
fn configure_accepts_action_alias() {
    let mode = dispatch_mode("configure", &args(json!({"action": "clear", "buffer": "circuit"})));
    assert_eq!(mode.as_deref(), Some("clear"));

    // Explicit `what` wins over the alias.
    let mode = dispatch_mode("configure", &args(json!({"what": "health", "action": "clear"})));
    assert_eq!(mode.as_deref(), Some("health"));
}

#[test]
fn generate_accepts_format_alias() {
    let mode = dispatch_mode("generate", &args(json!({"format": "har"})));
    assert_eq!(mode.as_deref(), Some("har"));
}

#[test]
fn missing_dispatch_param_is_none() {
    assert!(dispatch_mode("observe", &args(json!({}))).is_none());
    assert!(dispatch_mode("observe", &args(json!({"what": 42}))).is_none());
}
