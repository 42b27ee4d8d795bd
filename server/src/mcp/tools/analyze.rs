//! `analyze` — browser-side queries and annotation reads.

use std::time::Duration;

use serde_json::Value;
use serde_json::json;

use gasoline_annotations::WaitOutcome;
use gasoline_commands::AwaitOutcome;
use gasoline_commands::QueueError;
use gasoline_protocol::AnnotationSession;
use gasoline_protocol::CommandStatus;
use gasoline_protocol::ToolError;
use gasoline_protocol::ToolErrorCode;
use gasoline_protocol::ToolResult;

use crate::state::ServerState;

use super::Args;
use super::arg_bool;
use super::arg_str;
use super::limit_arg;
use super::timeout_arg;
use super::validate_selector;

const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

pub fn known_args(mode: &str) -> &'static [&'static str] {
    match mode {
        "dom" => &["selector", "timeout_ms"],
        "annotations" => &["name", "wait", "timeout_ms", "tab_id"],
        _ => &["limit"],
    }
}

pub async fn handle(state: &ServerState, mode: &str, args: &Args) -> ToolResult {
    match mode {
        "dom" => query_dom(state, args).await,
        "annotations" => annotations(state, args).await,
        // "performance"
        _ => {
            let snapshots = state.capture.recent_performance_snapshots(limit_arg(args));
            let latest = snapshots.first().cloned();
            ToolResult::json(&json!({
                "count": snapshots.len(),
                "latest": latest,
                "snapshots": snapshots,
            }))
        }
    }
}

/// Ask the extension to run a DOM query and wait for the correlated result.
async fn query_dom(state: &ServerState, args: &Args) -> ToolResult {
    let Some(selector) = arg_str(args, "selector") else {
        return ToolError::missing_param("selector").into_result();
    };
    if let Err(err) = validate_selector(selector) {
        return err.into_result();
    }

    let timeout = timeout_arg(args).unwrap_or(DEFAULT_QUERY_TIMEOUT);
    let ticket = match state.queue.enqueue(
        "query",
        json!({"selector": selector}),
        None,
        Some(timeout),
    ) {
        Ok(ticket) => ticket,
        Err(QueueError::Closed) => {
            return ToolError::new(
                ToolErrorCode::Expired,
                "command queue is shutting down",
                "restart the daemon and retry",
            )
            .into_result();
        }
        Err(QueueError::Full { depth }) => {
            return ToolError::new(
                ToolErrorCode::BatchTooLarge,
                format!("command queue is at capacity (depth {depth})"),
                "wait for in-flight commands to finish, then retry",
            )
            .into_result();
        }
    };
    let correlation_id = ticket.correlation_id.clone();

    match state.queue.await_result(ticket).await {
        AwaitOutcome::Result(result) if result.status == CommandStatus::Complete => {
            ToolResult::json(&json!({
                "correlation_id": correlation_id,
                "elapsed_ms": result.elapsed_ms,
                "result": result.payload,
            }))
        }
        AwaitOutcome::Result(result) => {
            let code = match result.status {
                CommandStatus::Timeout => ToolErrorCode::Timeout,
                CommandStatus::Expired => ToolErrorCode::Expired,
                _ => element_error_code(&result.payload),
            };
            ToolError::new(
                code,
                format!("dom query failed with status {}", result.status.as_str()),
                "broaden the selector or wait for the page to settle",
            )
            .into_result()
        }
        AwaitOutcome::TimedOut => {
            // A completion can race the deadline; claim it from the late
            // shelf before reporting a timeout.
            if let Some(result) = state.queue.late_result(&correlation_id) {
                if result.status == CommandStatus::Complete {
                    return ToolResult::json(&json!({
                        "correlation_id": correlation_id,
                        "elapsed_ms": result.elapsed_ms,
                        "result": result.payload,
                    }));
                }
            }
            ToolError::new(
                ToolErrorCode::Timeout,
                "dom query timed out waiting for the extension",
                "confirm the extension is connected, then retry",
            )
            .into_result()
        }
        AwaitOutcome::Cancelled => ToolError::new(
            ToolErrorCode::Expired,
            "dom query was cancelled before completion",
            "retry after the daemon finishes restarting",
        )
        .into_result(),
    }
}

/// Read (or block for) draw-mode sessions, resolving annotation details.
async fn annotations(state: &ServerState, args: &Args) -> ToolResult {
    let wait = arg_bool(args, "wait").unwrap_or(false);
    let timeout = timeout_arg(args).unwrap_or(DEFAULT_WAIT_TIMEOUT);

    if let Some(name) = arg_str(args, "name") {
        if let Some(named) = state.annotations.get_named_session(name) {
            return ToolResult::json(&json!({"named_session": named}));
        }
        if !wait {
            return ToolError::new(
                ToolErrorCode::ScopeNotFound,
                format!("no named session `{name}`"),
                "list sessions with analyze annotations, or start one with interact draw",
            )
            .into_result();
        }
        return match state.annotations.wait_for_named_session(name, timeout).await {
            WaitOutcome::Session(page) => ToolResult::json(&json!({"page": page})),
            WaitOutcome::TimedOut => timeout_error(),
            WaitOutcome::Closed => closed_error(),
        };
    }

    let session = if let Some(tab_id) = arg_str(args, "tab_id") {
        state.annotations.get_session(tab_id)
    } else {
        state.annotations.get_latest_session()
    };

    match (session, wait) {
        (Some(session), _) => session_result(state, session),
        (None, true) => match state.annotations.wait_for_session(timeout).await {
            WaitOutcome::Session(session) => session_result(state, session),
            WaitOutcome::TimedOut => timeout_error(),
            WaitOutcome::Closed => closed_error(),
        },
        (None, false) => ToolError::new(
            ToolErrorCode::NoActionsCaptured,
            "no draw-mode session captured yet",
            "start one with interact draw, or pass wait=true",
        )
        .into_result(),
    }
}

/// Bundle a session with whatever details are still cached for its
/// annotations.
fn session_result(state: &ServerState, session: AnnotationSession) -> ToolResult {
    let details: Vec<Value> = session
        .annotations
        .iter()
        .filter_map(|a| a.correlation_id.as_ref())
        .filter_map(|id| state.annotations.get_detail(id))
        .filter_map(|detail| serde_json::to_value(detail).ok())
        .collect();
    ToolResult::json(&json!({"session": session, "details": details}))
}

fn element_error_code(payload: &Value) -> ToolErrorCode {
    payload
        .get("error_code")
        .and_then(Value::as_str)
        .and_then(|code| serde_json::from_value(Value::String(code.to_string())).ok())
        .unwrap_or(ToolErrorCode::ElementNotFound)
}

fn timeout_error() -> ToolResult {
    ToolError::new(
        ToolErrorCode::Timeout,
        "timed out waiting for a draw-mode session",
        "draw on the page, then retry",
    )
    .into_result()
}

fn closed_error() -> ToolResult {
    ToolError::new(
        ToolErrorCode::Expired,
        "annotation store closed while waiting",
        "retry after the daemon finishes restarting",
    )
    .into_result()
}

#[cfg(test)]
#[path = "analyze.test.rs"]
mod tests;
