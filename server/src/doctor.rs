//! The doctor readiness battery and the setup fast-path JSONL scan.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use gasoline_protocol::DoctorCheck;
use gasoline_protocol::DoctorReport;

use crate::VERSION;
use crate::state::QUEUE_DEPTH_SOFT_CAP;
use crate::state::ServerState;

/// Fast-path scans look at this many trailing lines.
pub const FASTPATH_SCAN_LINES: usize = 200;

/// Run the fixed, ordered check battery. `include_uptime` is set on the
/// MCP/HTTP path and omitted by the CLI's offline setup check.
pub fn run_checks(state: &ServerState, include_uptime: bool) -> DoctorReport {
    let mut checks = Vec::new();

    checks.push(match state.extension_poll_age() {
        Some(age) if age <= crate::state::EXTENSION_STALE_AFTER => DoctorCheck::pass(
            "extension_connected",
            format!("extension polled {}ms ago", age.as_millis()),
        ),
        Some(age) => DoctorCheck::fail(
            "extension_connected",
            format!("extension last polled {}s ago", age.as_secs()),
            "open the instrumented browser tab so the extension reconnects",
        ),
        None => DoctorCheck::fail(
            "extension_connected",
            "the extension has never polled this daemon",
            "install/enable the browser extension and open a tab",
        ),
    });

    checks.push(
        if state.pilot_enabled.load(std::sync::atomic::Ordering::Relaxed) {
            DoctorCheck::pass("pilot_enabled", "AI web pilot is enabled")
        } else {
            DoctorCheck::warn(
                "pilot_enabled",
                "AI web pilot is disabled",
                "enable it in the extension popup or POST /settings",
            )
        },
    );

    checks.push(match state.tracked_tab() {
        Some(tab) => DoctorCheck::pass("tracked_tab", format!("tracking tab {}", tab.tab_id)),
        None => DoctorCheck::warn(
            "tracked_tab",
            "no browser tab is being tracked",
            "focus the tab you want instrumented",
        ),
    });

    let circuit = state.breaker.snapshot();
    checks.push(if circuit.circuit_open {
        DoctorCheck::fail(
            "circuit_breaker",
            format!(
                "circuit is open ({})",
                circuit.reason.as_deref().unwrap_or("unknown")
            ),
            "reduce telemetry volume, then configure clear buffer=circuit",
        )
    } else {
        DoctorCheck::pass("circuit_breaker", "circuit is closed")
    });

    let depth = state.queue.depth();
    checks.push(if depth >= QUEUE_DEPTH_SOFT_CAP {
        DoctorCheck::warn(
            "command_queue",
            format!("queue depth is {depth}"),
            "wait for in-flight commands or clear stuck ones",
        )
    } else {
        DoctorCheck::pass("command_queue", format!("queue depth is {depth}"))
    });

    if include_uptime {
        checks.push(DoctorCheck::pass(
            "server_uptime",
            format!("up {}s, version {VERSION}", state.uptime().as_secs()),
        ));
    }

    DoctorReport::aggregate(checks)
}

/// Tally of a fast-path telemetry log scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FastpathStats {
    pub events: u64,
    pub success: u64,
    pub failure: u64,
    pub methods: BTreeMap<String, u64>,
    pub error_codes: BTreeMap<String, u64>,
}

/// Scan the last [`FASTPATH_SCAN_LINES`] lines of a JSONL telemetry log.
/// Unparseable lines are skipped, not fatal.
pub fn scan_jsonl(path: &Path) -> io::Result<FastpathStats> {
    let content = std::fs::read_to_string(path)?;
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(FASTPATH_SCAN_LINES);

    let mut stats = FastpathStats::default();
    for line in &lines[start..] {
        let Ok(value) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        let Some(obj) = value.as_object() else {
            continue;
        };
        stats.events += 1;

        if let Some(method) = obj
            .get("method")
            .or_else(|| obj.get("event"))
            .and_then(Value::as_str)
        {
            *stats.methods.entry(method.to_string()).or_insert(0) += 1;
        }

        let failed = obj.get("status").and_then(Value::as_str) == Some("failure")
            || obj.get("success").and_then(Value::as_bool) == Some(false)
            || obj.get("error_code").is_some();
        if failed {
            stats.failure += 1;
            if let Some(code) = obj.get("error_code").and_then(Value::as_str) {
                *stats.error_codes.entry(code.to_string()).or_insert(0) += 1;
            }
        } else {
            stats.success += 1;
        }
    }
    Ok(stats)
}

/// Verdict of the failure-ratio threshold evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum FastpathVerdict {
    Pass { ratio: f64 },
    Fail { ratio: f64 },
    InsufficientSamples { samples: u64 },
}

pub fn evaluate_threshold(
    stats: &FastpathStats,
    min_samples: u64,
    max_failure_ratio: f64,
) -> FastpathVerdict {
    if stats.events < min_samples {
        return FastpathVerdict::InsufficientSamples {
            samples: stats.events,
        };
    }
    let ratio = if stats.events == 0 {
        0.0
    } else {
        stats.failure as f64 / stats.events as f64
    };
    if ratio > max_failure_ratio {
        FastpathVerdict::Fail { ratio }
    } else {
        FastpathVerdict::Pass { ratio }
    }
}

#[cfg(test)]
#[path = "doctor.test.rs"]
mod tests;
