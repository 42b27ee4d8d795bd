//! Tool handlers and shared argument plumbing.

pub mod analyze;
pub mod configure;
pub mod generate;
pub mod interact;
pub mod observe;

use std::time::Duration;

use serde_json::Value;

use gasoline_protocol::ToolError;
use gasoline_protocol::ToolErrorCode;

use super::modes;

pub type Args = serde_json::Map<String, Value>;

/// Argument keys accepted by every tool call.
pub const COMMON_ARGS: &[&str] = &["telemetry_mode"];

/// Await deadlines are clamped to this ceiling.
const MAX_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

pub fn arg_str<'a>(args: &'a Args, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

pub fn arg_u64(args: &Args, key: &str) -> Option<u64> {
    args.get(key).and_then(Value::as_u64)
}

pub fn arg_bool(args: &Args, key: &str) -> Option<bool> {
    args.get(key).and_then(Value::as_bool)
}

/// Read `limit`, defaulting to 50 and capping at 1000.
pub fn limit_arg(args: &Args) -> usize {
    arg_u64(args, "limit").unwrap_or(50).min(1000) as usize
}

/// Read `timeout_ms` as a clamped [`Duration`].
pub fn timeout_arg(args: &Args) -> Option<Duration> {
    arg_u64(args, "timeout_ms").map(|ms| Duration::from_millis(ms).min(MAX_COMMAND_TIMEOUT))
}

/// Reject selectors that smell like markup or script injection before they
/// reach the page.
pub fn validate_selector(selector: &str) -> Result<(), ToolError> {
    let lowered = selector.to_ascii_lowercase();
    let suspicious = selector.len() > 1000
        || selector.contains('<')
        || selector.contains('\u{0}')
        || selector.chars().any(char::is_control)
        || lowered.contains("javascript:");
    if suspicious {
        return Err(ToolError::new(
            ToolErrorCode::SelectorInjectionDetected,
            "selector contains markup or script content",
            "pass a plain CSS selector",
        )
        .with_param("selector"));
    }
    Ok(())
}

/// Names unknown top-level argument fields, excluding dispatch fields and
/// per-mode known parameters. Non-fatal; rendered as a `_warnings` block.
pub fn unknown_field_warning(tool: &str, args: &Args, known: &[&str]) -> Option<String> {
    let dispatch = modes::dispatch_keys(tool);
    let mut unknown: Vec<&str> = args
        .keys()
        .map(String::as_str)
        .filter(|key| {
            *key != "name"
                && *key != "arguments"
                && !dispatch.contains(key)
                && !COMMON_ARGS.contains(key)
                && !known.contains(key)
        })
        .collect();
    if unknown.is_empty() {
        return None;
    }
    unknown.sort_unstable();
    Some(format!("_warnings: unknown fields: {}", unknown.join(", ")))
}

#[cfg(test)]
#[path = "mod.test.rs"]
mod tests;
