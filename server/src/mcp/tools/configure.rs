//! `configure` — runtime settings, health reporting, and buffer clearing.

use serde_json::Value;
use serde_json::json;

use gasoline_alerts::AlertPolicy;
use gasoline_alerts::EventFilter;
use gasoline_protocol::AlertSeverity;
use gasoline_protocol::BufferKind;
use gasoline_protocol::TelemetryMode;
use gasoline_protocol::ToolError;
use gasoline_protocol::ToolErrorCode;
use gasoline_protocol::ToolResult;

use crate::VERSION;
use crate::state::SecurityMode;
use crate::state::ServerState;

use super::Args;
use super::arg_bool;
use super::arg_str;
use super::arg_u64;

pub fn known_args(mode: &str) -> &'static [&'static str] {
    match mode {
        "clear" => &["buffer"],
        "telemetry" => &["mode"],
        "alerts" => &[
            "enabled",
            "severity_min",
            "events",
            "throttle_seconds",
            "notification_max_per_minute",
        ],
        "security" => &["enabled", "mode", "rewrites_applied"],
        _ => &[],
    }
}

pub fn handle(state: &ServerState, mode: &str, args: &Args) -> ToolResult {
    match mode {
        "clear" => clear(state, args),
        "telemetry" => telemetry(state, args),
        "alerts" => alerts(state, args),
        "security" => security(state, args),
        // "health"
        _ => health(state),
    }
}

/// The full health view: circuit, queue, clients, uptime, security banner.
fn health(state: &ServerState) -> ToolResult {
    let circuit = state.breaker.snapshot();
    ToolResult::json(&json!({
        "status": "ok",
        "version": VERSION,
        "uptime_ms": state.uptime().as_millis() as u64,
        "port": state.port,
        "extension_connected": state.extension_connected(),
        "circuit_open": circuit.circuit_open,
        "reason": circuit.reason.clone(),
        "circuit": circuit,
        "queue_depth": state.queue.depth(),
        "clients": state.clients.count(),
        "pilot_enabled": state.pilot_enabled.load(std::sync::atomic::Ordering::Relaxed),
        "tracked_tab": state.tracked_tab(),
        "telemetry_mode": state.telemetry_default().as_str(),
        "alerts": state.alerts.policy(),
        "security_mode": state.security_mode(),
        "ready_for_interaction": state.ready_for_interaction(),
    }))
}

/// Clear a buffer, every buffer, or force-close the circuit.
fn clear(state: &ServerState, args: &Args) -> ToolResult {
    let Some(buffer) = arg_str(args, "buffer") else {
        return ToolError::missing_param("buffer").into_result();
    };
    match buffer {
        "circuit" => {
            state.breaker.force_close();
            ToolResult::json(&json!({"cleared": "circuit", "circuit_open": false}))
        }
        "all" => {
            state.capture.clear_all();
            ToolResult::json(&json!({"cleared": "all"}))
        }
        other => match BufferKind::parse(other) {
            Some(kind) => {
                state.capture.clear(kind);
                ToolResult::json(&json!({"cleared": kind.as_str()}))
            }
            None => {
                let mut valid: Vec<&str> =
                    BufferKind::ALL.iter().map(BufferKind::as_str).collect();
                valid.push("all");
                valid.push("circuit");
                ToolError::invalid_param("buffer", &valid).into_result()
            }
        },
    }
}

/// Set the server-default telemetry mode.
fn telemetry(state: &ServerState, args: &Args) -> ToolResult {
    let Some(mode) = arg_str(args, "mode") else {
        return ToolError::missing_param("mode").into_result();
    };
    let parsed = TelemetryMode::parse(mode);
    state.set_telemetry_default(parsed);
    ToolResult::json(&json!({"telemetry_mode": parsed.as_str()}))
}

/// Merge alert policy changes.
fn alerts(state: &ServerState, args: &Args) -> ToolResult {
    let mut policy: AlertPolicy = state.alerts.policy();
    if let Some(enabled) = arg_bool(args, "enabled") {
        policy.enabled = enabled;
    }
    if let Some(severity) = arg_str(args, "severity_min") {
        match AlertSeverity::parse(severity) {
            Some(severity) => policy.severity_min = severity,
            None => {
                return ToolError::invalid_param("severity_min", &["info", "warning", "error"])
                    .into_result();
            }
        }
    }
    if let Some(events) = args.get("events") {
        match events {
            Value::String(s) if s == "all" => policy.events = EventFilter::All,
            Value::Array(items) => {
                policy.events = EventFilter::Only(
                    items
                        .iter()
                        .filter_map(|item| item.as_str().map(str::to_string))
                        .collect(),
                );
            }
            _ => {
                return ToolError::new(
                    ToolErrorCode::InvalidParam,
                    "events must be \"all\" or a list of categories",
                    "pass \"all\" or e.g. [\"console_error\"]",
                )
                .with_param("events")
                .into_result();
            }
        }
    }
    if let Some(throttle) = arg_u64(args, "throttle_seconds") {
        policy.throttle_seconds = throttle;
    }
    if let Some(max) = arg_u64(args, "notification_max_per_minute") {
        policy.notification_max_per_minute = max as u32;
    }
    state.alerts.set_policy(policy.clone());
    ToolResult::json(&json!({"alerts": policy}))
}

/// Toggle the process-wide altered-environment banner.
fn security(state: &ServerState, args: &Args) -> ToolResult {
    let enabled = arg_bool(args, "enabled").unwrap_or(true);
    if !enabled {
        state.set_security_mode(None);
        return ToolResult::json(&json!({"security_mode": Value::Null}));
    }
    let mode = arg_str(args, "mode").unwrap_or("insecure-rewrites").to_string();
    let rewrites = args
        .get("rewrites_applied")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    let security = SecurityMode {
        mode,
        rewrites_applied: rewrites,
    };
    state.set_security_mode(Some(security.clone()));
    ToolResult::json(&json!({"security_mode": security, "production_parity": false}))
}

#[cfg(test)]
#[path = "configure.test.rs"]
mod tests;
