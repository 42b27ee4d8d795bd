use pretty_assertions::assert_eq;
use serde_json::Value;
use serde_json::json;

use gasoline_protocol::TelemetryMode;

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
fn health_reports_circuit_state() {
    let state = state();
    let result = handle(&state, "health", &args(json!({"what": "health"})));
    let body = body_of(&result);
    assert_eq!(body["circuit_open"], json!(false));
    assert_eq!(body["queue_depth"], json!(0));
    assert_eq!(body["telemetry_mode"], json!("auto"));
}

#[test]
fn clear_circuit_force_closes() {
    let state = state();
    // Trip the breaker: the default config opens after a 3-window streak.
    let t0 = std::time::Instant::now();
    for n in 0..4u64 {
        state
            .breaker
            .record_events_at(1500, t0 + std::time::Duration::from_secs(n));
    }
    assert!(state.breaker.is_open());

    let result = handle(
        &state,
        "clear",
        &args(json!({"action": "clear", "buffer": "circuit"})),
    );
    assert_eq!(body_of(&result)["circuit_open"], json!(false));
    assert!(!state.breaker.is_open());
}

#[test]
fn clear_requires_and_validates_buffer() {
    let state = state();
    let result = handle(&state, "clear", &args(json!({"what": "clear"})));
    assert_eq!(body_of(&result)["error_code"], json!("missing_param"));

    let result = handle(
        &state,
        "clear",
        &args(json!({"what": "clear", "buffer": "bogus"})),
    );
    let body = body_of(&result);
    assert_eq!(body["error_code"], json!("invalid_param"));
    assert!(body["message"].as_str().expect("message").contains("circuit"));
}

#[test]
fn clear_buffer_kind_empties_it() {
    let state = state();
    state
        .capture
        .ingest_logs(vec![json!({"level": "info", "message": "x"})]);
    let result = handle(
        &state,
        "clear",
        &args(json!({"what": "clear", "buffer": "logs"})),
    );
    assert_eq!(body_of(&result)["cleared"], json!("logs"));
    assert!(state.capture.recent_logs(0, None).is_empty());
}

#[test]
fn telemetry_sets_the_server_default() {
    let state = state();
    let result = handle(
        &state,
        "telemetry",
        &args(json!({"what": "telemetry", "mode": "off"})),
    );
    assert_eq!(body_of(&result)["telemetry_mode"], json!("off"));
    assert_eq!(state.telemetry_default(), TelemetryMode::Off);

    // Unknown modes fall back to auto rather than failing.
    let result = handle(
        &state,
        "telemetry",
        &args(json!({"what": "telemetry", "mode": "loud"})),
    );
    assert_eq!(body_of(&result)["telemetry_mode"], json!("auto"));
}

#[test]
fn alerts_merges_policy_fields() {
    let state = state();
    let result = handle(
        &state,
        "alerts",
        &args(json!({
            "what": "alerts",
            "enabled": true,
            "severity_min": "error",
            "events": ["console_error"],
            "notification_max_per_minute": 5,
        })),
    );
    let body = body_of(&result);
    assert_eq!(body["alerts"]["enabled"], json!(true));
    assert_eq!(body["alerts"]["severity_min"], json!("error"));
    assert_eq!(body["alerts"]["notification_max_per_minute"], json!(5));
    assert!(state.alerts.policy().enabled);
}

#[test]
fn security_banner_set_and_clear() {
    let state = state();
    let result = handle(
        &state,
        "security",
        &args(json!({
            "what": "security",
            "enabled": true,
            "mode": "cors-disabled",
            "rewrites_applied": ["disable-csp"],
        })),
    );
    let body = body_of(&result);
    assert_eq!(body["security_mode"]["mode"], json!("cors-disabled"));
    assert_eq!(body["production_parity"], json!(false));
    assert!(state.security_mode().is_some());

    let result = handle(
        &state,
        "security",
        &args(json!({"what": "security", "enabled": false})),
    );
    assert_eq!(body_of(&result)["security_mode"], json!(null));
    assert!(state.security_mode().is_none());
}
