//! `tools/list` schema generation.
//!
//! The `what` enums are embedded from the same mode tables the dispatcher
//! matches on, so schema and handler table cannot drift apart.

use serde_json::Value;
use serde_json::json;

use gasoline_protocol::mcp::ToolSpec;

use super::modes;

pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: modes::TOOL_OBSERVE.to_string(),
            description: "Read captured browser telemetry: console logs, network \
                          requests and bodies, WebSocket events, user actions, and \
                          performance snapshots."
                .to_string(),
            input_schema: object_schema(
                modes::OBSERVE_MODES,
                json!({
                    "limit": {"type": "integer", "description": "Max entries to return (default 50)."},
                    "level": {"type": "string", "description": "logs: filter by level."},
                    "url_contains": {"type": "string", "description": "network: URL substring filter."},
                    "method": {"type": "string", "description": "network: HTTP method filter."},
                    "status_min": {"type": "integer", "description": "network: minimum status."},
                    "status_max": {"type": "integer", "description": "network: maximum status."},
                    "body_contains": {"type": "string", "description": "network: body fingerprint filter."},
                    "connection_id": {"type": "string", "description": "websocket: connection filter."},
                }),
            ),
        },
        ToolSpec {
            name: modes::TOOL_ANALYZE.to_string(),
            description: "Inspect the live page: DOM queries through the extension, \
                          draw-mode annotation sessions, performance analysis."
                .to_string(),
            input_schema: object_schema(
                modes::ANALYZE_MODES,
                json!({
                    "selector": {"type": "string", "description": "dom: CSS selector to query."},
                    "name": {"type": "string", "description": "annotations: named session to read."},
                    "tab_id": {"type": "string", "description": "annotations: read one tab's session."},
                    "wait": {"type": "boolean", "description": "annotations: block for the next fresh session."},
                    "timeout_ms": {"type": "integer", "description": "Deadline for blocking modes."},
                }),
            ),
        },
        ToolSpec {
            name: modes::TOOL_INTERACT.to_string(),
            description: "Drive the browser: click, type, navigate, scroll, or start \
                          a draw-mode session. Commands are correlated and awaited."
                .to_string(),
            input_schema: object_schema(
                modes::INTERACT_MODES,
                json!({
                    "selector": {"type": "string", "description": "Target element selector."},
                    "text": {"type": "string", "description": "type: text to enter."},
                    "url": {"type": "string", "description": "navigate: absolute http(s) URL."},
                    "x": {"type": "integer", "description": "scroll: horizontal delta."},
                    "y": {"type": "integer", "description": "scroll: vertical delta."},
                    "timeout_ms": {"type": "integer", "description": "Command deadline."},
                }),
            ),
        },
        ToolSpec {
            name: modes::TOOL_GENERATE.to_string(),
            description: "Produce artifacts from captured telemetry: a HAR export or \
                          a markdown summary."
                .to_string(),
            input_schema: object_schema(
                modes::GENERATE_MODES,
                json!({
                    "path": {"type": "string", "description": "har: save location (tmp or relative)."},
                    "url_contains": {"type": "string", "description": "har: URL substring filter."},
                }),
            ),
        },
        ToolSpec {
            name: modes::TOOL_CONFIGURE.to_string(),
            description: "Daemon health and settings. Modes: health (report), clear \
                          (buffer: a buffer kind, \"all\", or \"circuit\"), telemetry \
                          (mode: auto|full|off), alerts (enabled, severity_min, \
                          events, throttle_seconds, notification_max_per_minute), \
                          security (enabled, mode, rewrites_applied)."
                .to_string(),
            input_schema: object_schema(
                modes::CONFIGURE_MODES,
                json!({
                    "buffer": {"type": "string", "description": "clear: buffer kind, \"all\", or \"circuit\"."},
                    "mode": {"type": "string", "description": "telemetry: auto|full|off; security: banner label."},
                    "enabled": {"type": "boolean", "description": "alerts/security: toggle."},
                    "severity_min": {"type": "string", "description": "alerts: info|warning|error."},
                    "events": {"description": "alerts: \"all\" or a category list."},
                    "throttle_seconds": {"type": "integer", "description": "alerts: per-category throttle."},
                    "notification_max_per_minute": {"type": "integer", "description": "alerts: rate cap."},
                    "rewrites_applied": {"type": "array", "description": "security: rewrite labels."},
                }),
            ),
        },
    ]
}

fn object_schema(what_enum: &[&str], extra_properties: Value) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert(
        "what".to_string(),
        json!({
            "type": "string",
            "enum": what_enum,
            "description": "Operation to perform.",
        }),
    );
    properties.insert(
        "telemetry_mode".to_string(),
        json!({
            "type": "string",
            "description": "Per-call telemetry override: auto|full|off.",
        }),
    );
    if let Value::Object(extra) = extra_properties {
        properties.extend(extra);
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": ["what"],
    })
}

#[cfg(test)]
#[path = "schema.test.rs"]
mod tests;
