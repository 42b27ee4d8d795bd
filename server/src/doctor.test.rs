use pretty_assertions::assert_eq;

use gasoline_protocol::CheckStatus;
use gasoline_protocol::HealthStatus;

use super::FastpathVerdict;
use super::evaluate_threshold;
use super::run_checks;
use super::scan_jsonl;
use crate::state::ServerState;
use crate::state::TrackedTab;

fn state() -> std::sync::Arc<ServerState> {
    ServerState::new(std::env::temp_dir().join("gasoline-test"), 0)
}

#[test]
fn cold_daemon_is_unhealthy_with_extension_fail() {
    let state = state();
    let report = run_checks(&state, true);
    assert_eq!(report.status, HealthStatus::Unhealthy);
    assert!(!report.ready_for_interaction);

    let extension = &report.checks[0];
    assert_eq!(extension.name, "extension_connected");
    assert_eq!(extension.status, CheckStatus::Fail);
}

#[test]
fn connected_daemon_without_tab_is_degraded() {
    let state = state();
    state.record_extension_poll();
    let report = run_checks(&state, true);
    assert_eq!(report.status, HealthStatus::Degraded);

    let tab = report
        .checks
        .iter()
        .find(|check| check.name == "tracked_tab")
        .expect("tracked_tab check");
    assert_eq!(tab.status, CheckStatus::Warn);
}

#[test]
fn fully_ready_daemon_is_healthy() {
    let state = state();
    state.record_extension_poll();
    state.set_tracked_tab(Some(TrackedTab {
        tab_id: "42".to_string(),
        url: "http://localhost:3000".to_string(),
    }));
    let report = run_checks(&state, true);
    assert_eq!(report.status, HealthStatus::Healthy);
    assert!(report.ready_for_interaction);
}

#[test]
fn checks_run_in_the_documented_order() {
    let state = state();
    let report = run_checks(&state, true);
    let names: Vec<&str> = report
        .checks
        .iter()
        .map(|check| check.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "extension_connected",
            "pilot_enabled",
            "tracked_tab",
            "circuit_breaker",
            "command_queue",
            "server_uptime",
        ]
    );

    // The CLI path omits server_uptime.
    assert_eq!(run_checks(&state, false).checks.len(), 5);
}

#[test]
fn jsonl_scan_tallies_events_and_failures() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("telemetry.jsonl");
    std::fs::write(
        &path,
        concat!(
            "{\"method\": \"observe\", \"status\": \"success\"}\n",
            "{\"method\": \"interact\", \"status\": \"failure\", \"error_code\": \"timeout\"}\n",
            "{\"method\": \"observe\", \"success\": true}\n",
            "not json at all\n",
            "{\"event\": \"interact\", \"error_code\": \"element_not_found\"}\n",
        ),
    )
    .expect("write");

    let stats = scan_jsonl(&path).expect("scan");
    assert_eq!(stats.events, 4);
    assert_eq!(stats.failure, 2);
    assert_eq!(stats.success, 2);
    assert_eq!(stats.methods.get("observe"), Some(&2));
    assert_eq!(stats.error_codes.get("timeout"), Some(&1));
}

#[test]
fn threshold_evaluation_covers_all_verdicts() {
    let mut stats = super::FastpathStats::default();
    stats.events = 5;
    stats.failure = 1;

    assert_eq!(
        evaluate_threshold(&stats, 10, 0.5),
        FastpathVerdict::InsufficientSamples { samples: 5 }
    );
    assert_eq!(
        evaluate_threshold(&stats, 5, 0.5),
        FastpathVerdict::Pass { ratio: 0.2 }
    );
    assert_eq!(
        evaluate_threshold(&stats, 5, 0.1),
        FastpathVerdict::Fail { ratio: 0.2 }
    );
}
