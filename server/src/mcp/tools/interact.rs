//! `interact` — drive the browser through the command queue.

use std::sync::atomic::Ordering;

use serde_json::Value;
use serde_json::json;

use gasoline_commands::AwaitOutcome;
use gasoline_commands::QueueError;
use gasoline_protocol::CommandResult;
use gasoline_protocol::CommandStatus;
use gasoline_protocol::CorrelationId;
use gasoline_protocol::ToolError;
use gasoline_protocol::ToolErrorCode;
use gasoline_protocol::ToolResult;

use crate::mcp::post::InteractMeta;
use crate::state::ServerState;

use super::Args;
use super::arg_str;
use super::timeout_arg;
use super::validate_selector;

pub fn known_args(mode: &str) -> &'static [&'static str] {
    match mode {
        "type" => &["selector", "text", "timeout_ms"],
        "navigate" => &["url", "timeout_ms"],
        "scroll" => &["selector", "x", "y", "timeout_ms"],
        "draw" => &["timeout_ms"],
        _ => &["selector", "timeout_ms"],
    }
}

pub async fn handle(
    state: &ServerState,
    mode: &str,
    args: &Args,
) -> (ToolResult, Option<InteractMeta>) {
    let command_args = match build_command_args(mode, args) {
        Ok(value) => value,
        Err(err) => return (err.into_result(), None),
    };

    let selector = arg_str(args, "selector").map(str::to_string);
    // Captured before the command runs: the diagnostics compare against the
    // previous command for the same selector.
    let prior_failure = selector
        .as_deref()
        .and_then(|s| state.queue.selector_failure(s));

    if mode == "draw" {
        state.annotations.mark_draw_started();
    }

    let ticket = match state
        .queue
        .enqueue(mode, command_args, None, timeout_arg(args))
    {
        Ok(ticket) => ticket,
        Err(QueueError::Closed) => {
            return (
                ToolError::new(
                    ToolErrorCode::Expired,
                    "command queue is shutting down",
                    "restart the daemon and retry",
                )
                .into_result(),
                None,
            );
        }
        Err(QueueError::Full { depth }) => {
            return (
                ToolError::new(
                    ToolErrorCode::BatchTooLarge,
                    format!("command queue is at capacity (depth {depth})"),
                    "wait for in-flight commands to finish, then retry",
                )
                .into_result(),
                None,
            );
        }
    };
    let correlation_id = ticket.correlation_id.clone();

    match state.queue.await_result(ticket).await {
        AwaitOutcome::Result(result) => {
            let meta = InteractMeta {
                elapsed_ms: result.elapsed_ms,
                status: result.status,
                selector: selector.clone(),
                prior_selector_failure: prior_failure,
            };
            match result.status {
                CommandStatus::Complete => completed(state, &correlation_id, result, meta),
                CommandStatus::Error => {
                    (error_from_payload(&result.payload).into_result(), Some(meta))
                }
                CommandStatus::Timeout | CommandStatus::Expired => {
                    state.recent_hard_failure.store(true, Ordering::Relaxed);
                    let code = if result.status == CommandStatus::Timeout {
                        ToolErrorCode::Timeout
                    } else {
                        ToolErrorCode::Expired
                    };
                    (
                        ToolError::new(
                            code,
                            format!("browser reported {} for `{mode}`", result.status.as_str()),
                            "retry once with a longer timeout_ms",
                        )
                        .into_result(),
                        Some(meta),
                    )
                }
            }
        }
        AwaitOutcome::TimedOut => {
            // A completion can race the deadline; claim it from the late
            // shelf before reporting a timeout.
            if let Some(result) = state.queue.late_result(&correlation_id) {
                if result.status == CommandStatus::Complete {
                    let meta = InteractMeta {
                        elapsed_ms: result.elapsed_ms,
                        status: result.status,
                        selector: selector.clone(),
                        prior_selector_failure: prior_failure,
                    };
                    return completed(state, &correlation_id, result, meta);
                }
            }
            state.recent_hard_failure.store(true, Ordering::Relaxed);
            (
                ToolError::new(
                    ToolErrorCode::Timeout,
                    format!("`{mode}` command timed out waiting for the extension"),
                    "confirm the extension is connected, then retry",
                )
                .into_result(),
                None,
            )
        }
        AwaitOutcome::Cancelled => (
            ToolError::new(
                ToolErrorCode::Expired,
                "command was cancelled before completion",
                "retry after the daemon finishes restarting",
            )
            .into_result(),
            None,
        ),
    }
}

fn completed(
    state: &ServerState,
    correlation_id: &CorrelationId,
    result: CommandResult,
    meta: InteractMeta,
) -> (ToolResult, Option<InteractMeta>) {
    state.recent_hard_failure.store(false, Ordering::Relaxed);
    let body = ToolResult::json(&json!({
        "status": "complete",
        "correlation_id": correlation_id,
        "elapsed_ms": result.elapsed_ms,
        "result": result.payload,
    }));
    (body, Some(meta))
}

/// Per-mode argument validation; returns the args forwarded to the
/// extension.
fn build_command_args(mode: &str, args: &Args) -> Result<Value, ToolError> {
    let selector = arg_str(args, "selector");
    if let Some(selector) = selector {
        validate_selector(selector)?;
    }

    match mode {
        "click" => {
            let selector = selector.ok_or_else(|| ToolError::missing_param("selector"))?;
            Ok(json!({"selector": selector}))
        }
        "type" => {
            let selector = selector.ok_or_else(|| ToolError::missing_param("selector"))?;
            let text = arg_str(args, "text").ok_or_else(|| ToolError::missing_param("text"))?;
            Ok(json!({"selector": selector, "text": text}))
        }
        "navigate" => {
            let url = arg_str(args, "url").ok_or_else(|| ToolError::missing_param("url"))?;
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ToolError::new(
                    ToolErrorCode::InvalidParam,
                    "url must be http:// or https://",
                    "pass an absolute http(s) URL",
                )
                .with_param("url"));
            }
            Ok(json!({"url": url}))
        }
        "scroll" => {
            let x = args.get("x").and_then(Value::as_i64).unwrap_or(0);
            let y = args.get("y").and_then(Value::as_i64).unwrap_or(0);
            match selector {
                Some(selector) => Ok(json!({"selector": selector})),
                None if x != 0 || y != 0 => Ok(json!({"x": x, "y": y})),
                None => Err(ToolError::missing_param("selector")
                    .with_hint("pass a selector to scroll into view, or x/y deltas")),
            }
        }
        // "draw"
        _ => Ok(json!({})),
    }
}

/// Map an extension-reported error payload to a structured tool error.
fn error_from_payload(payload: &Value) -> ToolError {
    let code = payload
        .get("error_code")
        .and_then(Value::as_str)
        .and_then(|code| serde_json::from_value(Value::String(code.to_string())).ok())
        .unwrap_or(ToolErrorCode::ElementNotFound);
    let message = payload
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("the browser could not execute the command");
    ToolError::new(code, message, "inspect the page with analyze dom, then retry")
}

#[cfg(test)]
#[path = "interact.test.rs"]
mod tests;
