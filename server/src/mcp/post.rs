//! Tool-response post-processing.
//!
//! Applied in order after the handler returns: CSP hint, security-mode
//! banner, per-client telemetry deltas, interact diagnostic warning. Each
//! step is a standalone function over a synthetic result, so the concerns
//! stay testable in isolation.

use serde_json::Value;
use serde_json::json;

use gasoline_commands::FastCompletionCheck;
use gasoline_commands::diagnostic_warning;
use gasoline_protocol::CommandStatus;
use gasoline_protocol::TelemetryCounts;
use gasoline_protocol::TelemetryMode;
use gasoline_protocol::ToolResult;

use crate::state::ServerState;

/// What the dispatcher knows about the call being post-processed.
pub struct PostContext {
    pub tool: String,
    pub client_id: String,
    pub telemetry_override: Option<TelemetryMode>,
    pub interact: Option<InteractMeta>,
}

/// Completion facts for interact commands, captured by the handler.
#[derive(Debug, Clone)]
pub struct InteractMeta {
    pub elapsed_ms: u64,
    pub status: CommandStatus,
    pub selector: Option<String>,
    pub prior_selector_failure: Option<CommandStatus>,
}

pub fn post_process(state: &ServerState, result: ToolResult, ctx: &PostContext) -> ToolResult {
    let result = apply_csp_hint(state, result);
    let result = apply_security_banner(state, result);
    let result = apply_telemetry(state, result, ctx);
    apply_diagnostic(state, result, ctx)
}

/// Surface a recent CSP blockage so the caller stops retrying blindly.
fn apply_csp_hint(state: &ServerState, mut result: ToolResult) -> ToolResult {
    if let Some(note) = state.csp_note() {
        result.set_meta("csp_restricted", Value::Bool(true));
        result.push_text(format!("note: page CSP restricted a recent command: {note}"));
    }
    result
}

/// Prefix the altered-environment banner and stamp the metadata.
fn apply_security_banner(state: &ServerState, mut result: ToolResult) -> ToolResult {
    let Some(security) = state.security_mode() else {
        return result;
    };
    if let Some(block) = result.content.first_mut() {
        block.text = format!("[ALTERED ENVIRONMENT] {}", block.text);
    }
    result.set_meta("security_mode", Value::String(security.mode));
    result.set_meta("production_parity", Value::Bool(false));
    result.set_meta(
        "insecure_rewrites_applied",
        json!(security.rewrites_applied),
    );
    result
}

/// Per-client telemetry deltas (§ multi-client registry). Cursors advance
/// only on successful calls.
fn apply_telemetry(state: &ServerState, mut result: ToolResult, ctx: &PostContext) -> ToolResult {
    if result.is_error() {
        return result;
    }
    let mode = ctx.telemetry_override.unwrap_or_else(|| state.telemetry_default());
    if mode == TelemetryMode::Off {
        return result;
    }

    let delta =
        state
            .clients
            .delta_and_advance(&ctx.client_id, state.capture.counts(), &ctx.tool);
    let changed = !delta.is_zero();

    result.set_meta("telemetry_changed", Value::Bool(changed));
    match mode {
        TelemetryMode::Auto if !changed => {}
        TelemetryMode::Off => {}
        TelemetryMode::Auto => {
            result.set_meta("telemetry_summary", summary_value(&delta, None));
        }
        TelemetryMode::Full => {
            result.set_meta(
                "telemetry_summary",
                summary_value(&delta, Some(state.ready_for_interaction())),
            );
        }
    }
    result
}

fn summary_value(delta: &TelemetryCounts, ready: Option<bool>) -> Value {
    let mut summary = json!({
        "new_logs_since_last_call": delta.logs,
        "new_network_bodies_since_last_call": delta.network_bodies,
        "new_network_waterfall_since_last_call": delta.network_waterfall,
        "new_websocket_events_since_last_call": delta.websocket_events,
        "new_websocket_status_since_last_call": delta.websocket_status,
        "new_actions_since_last_call": delta.actions,
        "new_performance_snapshots_since_last_call": delta.performance_snapshots,
        "new_extension_logs_since_last_call": delta.extension_logs,
    });
    if let (Some(ready), Some(map)) = (ready, summary.as_object_mut()) {
        map.insert("ready_for_interaction".to_string(), Value::Bool(ready));
    }
    summary
}

/// Attach the fast-completion diagnostic for interact results.
fn apply_diagnostic(state: &ServerState, mut result: ToolResult, ctx: &PostContext) -> ToolResult {
    let Some(meta) = &ctx.interact else {
        return result;
    };
    let check = FastCompletionCheck {
        elapsed_ms: meta.elapsed_ms,
        status: Some(meta.status),
        selector: meta.selector.clone(),
        last_poll_age: state.extension_poll_age(),
        last_draw_age: state.last_draw_age(),
        prior_selector_failure: meta.prior_selector_failure,
    };
    if let Some(warning) = diagnostic_warning(&check) {
        result.set_meta("diagnostic_warning", Value::String(warning));
        result.set_meta("ready_for_interaction", Value::Bool(false));
    }
    result
}

#[cfg(test)]
#[path = "post.test.rs"]
mod tests;
