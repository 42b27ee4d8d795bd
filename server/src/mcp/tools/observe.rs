//! `observe` — passive reads over the capture buffers.

use serde_json::json;

use gasoline_capture::NetworkFilter;
use gasoline_protocol::ToolResult;

use crate::state::ServerState;

use super::Args;
use super::arg_str;
use super::arg_u64;
use super::limit_arg;

pub fn known_args(mode: &str) -> &'static [&'static str] {
    match mode {
        "logs" => &["limit", "level"],
        "network" => &[
            "limit",
            "url_contains",
            "method",
            "status_min",
            "status_max",
            "body_contains",
        ],
        "websocket" => &["limit", "connection_id"],
        _ => &["limit"],
    }
}

pub fn handle(state: &ServerState, mode: &str, args: &Args) -> ToolResult {
    let limit = limit_arg(args);
    match mode {
        "errors" => {
            let entries = state.capture.error_logs(limit);
            ToolResult::json(&json!({
                "count": entries.len(),
                "entries": entries,
                "dropped": state.capture.dropped().logs,
            }))
        }
        "logs" => {
            let entries = state.capture.recent_logs(limit, arg_str(args, "level"));
            ToolResult::json(&json!({
                "count": entries.len(),
                "entries": entries,
                "dropped": state.capture.dropped().logs,
            }))
        }
        "network" => {
            let filter = NetworkFilter {
                url_contains: arg_str(args, "url_contains").map(str::to_string),
                method: arg_str(args, "method").map(str::to_string),
                status_min: arg_u64(args, "status_min").map(|n| n as u16),
                status_max: arg_u64(args, "status_max").map(|n| n as u16),
                body_contains: arg_str(args, "body_contains").map(str::to_string),
            };
            let bodies = state.capture.recent_network_bodies(limit, &filter);
            ToolResult::json(&json!({
                "count": bodies.len(),
                "entries": bodies,
                "dropped": state.capture.dropped().network_bodies,
            }))
        }
        "websocket" => {
            let events = state
                .capture
                .recent_websocket_events(limit, arg_str(args, "connection_id"));
            let status = state.capture.recent_websocket_status(limit);
            ToolResult::json(&json!({
                "count": events.len(),
                "events": events,
                "status": status,
                "dropped": state.capture.dropped().websocket_events,
            }))
        }
        "actions" => {
            let entries = state.capture.recent_actions(limit);
            ToolResult::json(&json!({
                "count": entries.len(),
                "entries": entries,
                "dropped": state.capture.dropped().actions,
            }))
        }
        "performance" => {
            let entries = state.capture.recent_performance_snapshots(limit);
            ToolResult::json(&json!({
                "count": entries.len(),
                "entries": entries,
                "dropped": state.capture.dropped().performance_snapshots,
            }))
        }
        // "summary"
        _ => {
            let counts = state.capture.counts();
            let lengths = state.capture.lengths();
            let dropped = state.capture.dropped();
            ToolResult::json(&json!({
                "total_written": counts,
                "buffered": lengths,
                "dropped": dropped,
                "queue_depth": state.queue.depth(),
                "circuit": state.breaker.snapshot(),
                "extension_connected": state.extension_connected(),
            }))
        }
    }
}

#[cfg(test)]
#[path = "observe.test.rs"]
mod tests;
