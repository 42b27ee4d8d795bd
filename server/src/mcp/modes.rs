//! The tool/mode dispatch tables.
//!
//! These consts are the single source of truth: the dispatcher matches
//! against them and the schema generator embeds them as the `what` enum, so
//! the advertised schema cannot drift from the handler table.

use serde_json::Value;

pub const TOOL_OBSERVE: &str = "observe";
pub const TOOL_ANALYZE: &str = "analyze";
pub const TOOL_INTERACT: &str = "interact";
pub const TOOL_GENERATE: &str = "generate";
pub const TOOL_CONFIGURE: &str = "configure";

pub const TOOLS: &[&str] = &[
    TOOL_OBSERVE,
    TOOL_ANALYZE,
    TOOL_INTERACT,
    TOOL_GENERATE,
    TOOL_CONFIGURE,
];

pub const OBSERVE_MODES: &[&str] = &[
    "errors",
    "logs",
    "network",
    "websocket",
    "actions",
    "performance",
    "summary",
];

pub const ANALYZE_MODES: &[&str] = &["dom", "annotations", "performance"];

pub const INTERACT_MODES: &[&str] = &["click", "type", "navigate", "scroll", "draw"];

pub const GENERATE_MODES: &[&str] = &["har", "summary"];

pub const CONFIGURE_MODES: &[&str] = &["health", "clear", "telemetry", "alerts", "security"];

/// The valid modes for `tool`, or `None` for an unknown tool.
pub fn modes_for(tool: &str) -> Option<&'static [&'static str]> {
    match tool {
        TOOL_OBSERVE => Some(OBSERVE_MODES),
        TOOL_ANALYZE => Some(ANALYZE_MODES),
        TOOL_INTERACT => Some(INTERACT_MODES),
        TOOL_GENERATE => Some(GENERATE_MODES),
        TOOL_CONFIGURE => Some(CONFIGURE_MODES),
        _ => None,
    }
}

/// Argument keys accepted as the dispatch parameter, primary first.
/// `configure` historically accepts `action` and `generate` accepts
/// `format` as aliases.
pub fn dispatch_keys(tool: &str) -> &'static [&'static str] {
    match tool {
        TOOL_CONFIGURE => &["what", "action"],
        TOOL_GENERATE => &["what", "format"],
        _ => &["what"],
    }
}

/// Resolve the dispatch mode from the arguments.
pub fn dispatch_mode(tool: &str, args: &serde_json::Map<String, Value>) -> Option<String> {
    dispatch_keys(tool)
        .iter()
        .find_map(|key| args.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
#[path = "modes.test.rs"]
mod tests;
