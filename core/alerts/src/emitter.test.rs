use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use pretty_assertions::assert_eq;
use serde_json::Value;

use gasoline_protocol::Alert;
use gasoline_protocol::AlertSeverity;

use super::AlertEmitter;
use super::AlertPolicy;
use super::AlertSink;
use super::EmitOutcome;
use super::EventFilter;

#[derive(Default)]
struct Recorder {
    lines: Mutex<Vec<String>>,
}

impl AlertSink for Recorder {
    fn write_line(&self, line: &str) {
        self.lines.lock().expect("sink lock").push(line.to_string());
    }
}

fn emitter_with(policy: AlertPolicy) -> (AlertEmitter, Arc<Recorder>) {
    let emitter = AlertEmitter::new();
    let recorder = Arc::new(Recorder::default());
    emitter.set_sink(Arc::clone(&recorder) as Arc<dyn AlertSink>);
    emitter.set_policy(policy);
    (emitter, recorder)
}

fn enabled_policy() -> AlertPolicy {
    AlertPolicy {
        enabled: true,
        severity_min: AlertSeverity::Info,
        events: EventFilter::All,
        throttle_seconds: 0,
        notification_max_per_minute: 100,
    }
}

fn alert(category: &str, severity: AlertSeverity, message: &str) -> Alert {
    Alert::new(category, severity, message)
}

#[test]
fn disabled_emitter_drops_everything() {
    let (emitter, recorder) = emitter_with(AlertPolicy::default());
    let outcome = emitter.emit(alert("console_error", AlertSeverity::Error, "boom"));
    assert_eq!(outcome, EmitOutcome::DroppedDisabled);
    assert!(recorder.lines.lock().expect("lock").is_empty());
}

#[test]
fn severity_floor_filters() {
    let policy = AlertPolicy {
        severity_min: AlertSeverity::Error,
        ..enabled_policy()
    };
    let (emitter, _) = emitter_with(policy);
    assert_eq!(
        emitter.emit(alert("net", AlertSeverity::Warning, "slow")),
        EmitOutcome::DroppedSeverity
    );
    assert_eq!(
        emitter.emit(alert("net", AlertSeverity::Error, "down")),
        EmitOutcome::Emitted
    );
}

#[test]
fn event_filter_matches_categories() {
    let policy = AlertPolicy {
        events: EventFilter::Only(["console_error".to_string()].into_iter().collect()),
        ..enabled_policy()
    };
    let (emitter, _) = emitter_with(policy);
    assert_eq!(
        emitter.emit(alert("network", AlertSeverity::Error, "x")),
        EmitOutcome::DroppedFiltered
    );
    assert_eq!(
        emitter.emit(alert("console_error", AlertSeverity::Error, "x")),
        EmitOutcome::Emitted
    );
}

#[test]
fn duplicate_fingerprint_within_window_drops() {
    let (emitter, recorder) = emitter_with(enabled_policy());
    assert_eq!(
        emitter.emit(alert("c", AlertSeverity::Error, "same")),
        EmitOutcome::Emitted
    );
    assert_eq!(
        emitter.emit(alert("c", AlertSeverity::Error, "same")),
        EmitOutcome::DroppedDuplicate
    );
    assert_eq!(recorder.lines.lock().expect("lock").len(), 1);
}

#[test]
fn per_minute_cap_applies() {
    let policy = AlertPolicy {
        notification_max_per_minute: 2,
        ..enabled_policy()
    };
    let (emitter, _) = emitter_with(policy);
    assert_eq!(
        emitter.emit(alert("c", AlertSeverity::Error, "1")),
        EmitOutcome::Emitted
    );
    assert_eq!(
        emitter.emit(alert("c", AlertSeverity::Error, "2")),
        EmitOutcome::Emitted
    );
    assert_eq!(
        emitter.emit(alert("c", AlertSeverity::Error, "3")),
        EmitOutcome::DroppedRate
    );
}

#[test]
fn throttled_alerts_batch_and_drain() {
    let policy = AlertPolicy {
        throttle_seconds: 3600,
        ..enabled_policy()
    };
    let (emitter, recorder) = emitter_with(policy);
    assert_eq!(
        emitter.emit(alert("c", AlertSeverity::Error, "first")),
        EmitOutcome::Emitted
    );
    assert_eq!(
        emitter.emit(alert("c", AlertSeverity::Error, "second")),
        EmitOutcome::Throttled
    );
    assert_eq!(emitter.pending_count(), 1);

    assert_eq!(emitter.drain_pending(), 1);
    assert_eq!(emitter.pending_count(), 0);
    assert_eq!(recorder.lines.lock().expect("lock").len(), 2);
}

#[test]
fn emitted_line_is_a_notification_envelope() {
    let (emitter, recorder) = emitter_with(enabled_policy());
    emitter.emit(alert("console_error", AlertSeverity::Error, "boom"));

    let lines = recorder.lines.lock().expect("lock");
    let value: Value = serde_json::from_str(&lines[0]).expect("valid json line");
    assert_eq!(value["jsonrpc"], "2.0");
    assert_eq!(value["method"], "notifications/message");
    assert_eq!(value["params"]["alert"]["category"], "console_error");
    // A notification carries no id.
    assert!(value.get("id").is_none());
}

#[test]
fn minute_window_resets_after_boundary() {
    let policy = AlertPolicy {
        notification_max_per_minute: 1,
        ..enabled_policy()
    };
    let (emitter, _) = emitter_with(policy);
    let t0 = Instant::now();
    assert_eq!(
        emitter.emit_at(alert("a", AlertSeverity::Error, "1"), t0),
        EmitOutcome::Emitted
    );
    assert_eq!(
        emitter.emit_at(alert("b", AlertSeverity::Error, "2"), t0 + Duration::from_secs(30)),
        EmitOutcome::DroppedRate
    );
    assert_eq!(
        emitter.emit_at(alert("c", AlertSeverity::Error, "3"), t0 + Duration::from_secs(61)),
        EmitOutcome::Emitted
    );
}
