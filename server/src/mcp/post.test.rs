use pretty_assertions::assert_eq;
use serde_json::json;

use gasoline_protocol::CommandStatus;
use gasoline_protocol::TelemetryMode;
use gasoline_protocol::ToolResult;

use super::InteractMeta;
use super::PostContext;
use super::post_process;
use crate::state::SecurityMode;
use crate::state::ServerState;

fn state() -> std::sync::Arc<ServerState> {
    ServerState::new(std::env::temp_dir().join("gasoline-test"), 0)
}

fn ctx(client: &str) -> PostContext {
    PostContext {
        tool: "observe".to_string(),
        client_id: client.to_string(),
        telemetry_override: None,
        interact: None,
    }
}

#[test]
fn auto_mode_first_call_changed_second_not() {
    let state = state();
    state
        .capture
        .ingest_logs(vec![json!({"level": "error", "message": "x"})]);

    let first = post_process(&state, ToolResult::text("{}"), &ctx("cli-1"));
    assert_eq!(first.meta("telemetry_changed"), Some(&json!(true)));
    assert!(first.meta("telemetry_summary").is_some());

    let second = post_process(&state, ToolResult::text("{}"), &ctx("cli-1"));
    assert_eq!(second.meta("telemetry_changed"), Some(&json!(false)));
    // In auto mode an unchanged call carries no summary.
    assert!(second.meta("telemetry_summary").is_none());
}

#[test]
fn full_mode_always_carries_summary_with_readiness() {
    let state = state();
    let mut context = ctx("cli-1");
    context.telemetry_override = Some(TelemetryMode::Full);

    let result = post_process(&state, ToolResult::text("{}"), &context);
    let summary = result.meta("telemetry_summary").expect("summary");
    assert_eq!(summary["new_logs_since_last_call"], json!(0));
    assert_eq!(summary["ready_for_interaction"], json!(false));
}

#[test]
fn off_mode_emits_nothing() {
    let state = state();
    let mut context = ctx("cli-1");
    context.telemetry_override = Some(TelemetryMode::Off);

    let result = post_process(&state, ToolResult::text("{}"), &context);
    assert!(result.meta("telemetry_changed").is_none());
    assert!(result.meta("telemetry_summary").is_none());
}

#[test]
fn error_results_do_not_advance_cursors() {
    let state = state();
    state
        .capture
        .ingest_logs(vec![json!({"level": "error", "message": "x"})]);

    let mut error = ToolResult::text("{}");
    error.is_error = Some(true);
    let processed = post_process(&state, error, &ctx("cli-1"));
    assert!(processed.meta("telemetry_changed").is_none());

    // The next successful call still sees the delta.
    let ok = post_process(&state, ToolResult::text("{}"), &ctx("cli-1"));
    assert_eq!(ok.meta("telemetry_changed"), Some(&json!(true)));
}

#[test]
fn clients_have_isolated_cursors() {
    let state = state();
    state
        .capture
        .ingest_logs(vec![json!({"level": "info", "message": "x"})]);

    let a = post_process(&state, ToolResult::text("{}"), &ctx("client-a"));
    assert_eq!(a.meta("telemetry_changed"), Some(&json!(true)));

    let b = post_process(&state, ToolResult::text("{}"), &ctx("client-b"));
    assert_eq!(b.meta("telemetry_changed"), Some(&json!(true)));
}

#[test]
fn security_banner_prefixes_first_block() {
    let state = state();
    state.set_security_mode(Some(SecurityMode {
        mode: "insecure-rewrites".to_string(),
        rewrites_applied: vec!["disable-csp".to_string()],
    }));

    let result = post_process(&state, ToolResult::text("body"), &ctx("cli-1"));
    assert!(result
        .first_text()
        .expect("text")
        .starts_with("[ALTERED ENVIRONMENT] "));
    assert_eq!(result.meta("production_parity"), Some(&json!(false)));
    assert_eq!(
        result.meta("insecure_rewrites_applied"),
        Some(&json!(["disable-csp"]))
    );
}

#[test]
fn csp_note_attaches_hint_block() {
    let state = state();
    state.set_csp_note(Some("inline script blocked".to_string()));

    let result = post_process(&state, ToolResult::text("body"), &ctx("cli-1"));
    assert_eq!(result.meta("csp_restricted"), Some(&json!(true)));
    assert!(result.content.len() > 1);
}

#[test]
fn fast_interact_completion_attaches_diagnostic() {
    let state = state();
    let mut context = ctx("cli-1");
    context.interact = Some(InteractMeta {
        elapsed_ms: 2,
        status: CommandStatus::Complete,
        selector: Some("#go".to_string()),
        prior_selector_failure: None,
    });

    // No extension poll has ever happened: readiness is stale.
    let result = post_process(&state, ToolResult::text("{}"), &context);
    let warning = result.meta("diagnostic_warning").expect("warning");
    assert!(warning.as_str().expect("str").contains("unusually fast"));
    assert_eq!(result.meta("ready_for_interaction"), Some(&json!(false)));
}

#[test]
fn healthy_interact_completion_has_no_diagnostic() {
    let state = state();
    state.record_extension_poll();
    let mut context = ctx("cli-1");
    context.interact = Some(InteractMeta {
        elapsed_ms: 150,
        status: CommandStatus::Complete,
        selector: Some("#go".to_string()),
        prior_selector_failure: None,
    });

    let result = post_process(&state, ToolResult::text("{}"), &context);
    assert!(result.meta("diagnostic_warning").is_none());
}
