use pretty_assertions::assert_eq;
use serde_json::json;

use super::BufferKind;
use super::EventTime;
use super::LogEntry;
use super::NetworkBody;
use super::TelemetryCounts;
use super::TelemetryMode;
use super::WsDirection;

#[test]
fn event_time_accepts_millis_and_rfc3339() {
    let ms = EventTime::Millis(1_700_000_000_000);
    assert_eq!(ms.to_millis(), Some(1_700_000_000_000));

    let text = EventTime::Text("2023-11-14T22:13:20Z".to_string());
    assert_eq!(text.to_millis(), Some(1_700_000_000_000));

    let garbage = EventTime::Text("yesterday".to_string());
    assert_eq!(garbage.to_millis(), None);
}

#[test]
fn log_entry_requires_level() {
    let ok: Result<LogEntry, _> =
        serde_json::from_value(json!({"level": "error", "message": "boom"}));
    assert!(ok.is_ok());

    let missing: Result<LogEntry, _> = serde_json::from_value(json!({"message": "boom"}));
    assert!(missing.is_err());
}

#[test]
fn log_entry_keeps_unknown_fields() {
    let entry: LogEntry = serde_json::from_value(json!({
        "level": "warn",
        "message": "x",
        "stack": "at foo()",
    }))
    .expect("valid entry");
    assert_eq!(entry.extra["stack"], json!("at foo()"));
}

#[test]
fn network_body_status_zero_is_pending() {
    let body: NetworkBody =
        serde_json::from_value(json!({"method": "GET", "url": "http://x"})).expect("valid");
    assert!(body.is_pending());
    assert!(!body.request_truncated);
}

#[test]
fn body_contains_checks_both_sides() {
    let body: NetworkBody = serde_json::from_value(json!({
        "method": "POST",
        "url": "http://x",
        "status": 200,
        "request_body": "{\"token\": \"abc\"}",
        "response_body": "{\"ok\": true}",
    }))
    .expect("valid");
    assert!(body.body_contains("token"));
    assert!(body.body_contains("ok"));
    assert!(!body.body_contains("missing"));
}

#[test]
fn ws_direction_serializes_snake_case() {
    assert_eq!(
        serde_json::to_value(WsDirection::Received).expect("serializable"),
        json!("received")
    );
}

#[test]
fn buffer_kind_parse_roundtrips() {
    for kind in BufferKind::ALL {
        assert_eq!(BufferKind::parse(kind.as_str()), Some(kind));
    }
    assert_eq!(BufferKind::parse("nope"), None);
}

#[test]
fn counts_delta_saturates() {
    let mut newer = TelemetryCounts::default();
    newer.logs = 10;
    newer.actions = 3;
    let mut older = TelemetryCounts::default();
    older.logs = 4;
    older.actions = 5; // cursor ahead of counts (cleared buffer)

    let delta = newer.delta_since(&older);
    assert_eq!(delta.logs, 6);
    assert_eq!(delta.actions, 0);
    assert!(!delta.is_zero());
    assert_eq!(TelemetryCounts::default().delta_since(&older).total(), 0);
}

#[test]
fn telemetry_mode_falls_back_to_auto() {
    assert_eq!(TelemetryMode::parse("full"), TelemetryMode::Full);
    assert_eq!(TelemetryMode::parse("off"), TelemetryMode::Off);
    assert_eq!(TelemetryMode::parse("auto"), TelemetryMode::Auto);
    assert_eq!(TelemetryMode::parse("verbose"), TelemetryMode::Auto);
}
