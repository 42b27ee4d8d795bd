//! `generate` — derived artifacts from captured telemetry.

use std::path::Path;

use serde_json::Value;
use serde_json::json;

use gasoline_protocol::ToolError;
use gasoline_protocol::ToolErrorCode;
use gasoline_protocol::ToolResult;
use gasoline_protocol::telemetry::NetworkBody;

use crate::VERSION;
use crate::state::ServerState;

use super::Args;
use super::arg_str;

pub fn known_args(mode: &str) -> &'static [&'static str] {
    match mode {
        "har" => &["path", "url_contains"],
        _ => &[],
    }
}

pub fn handle(state: &ServerState, mode: &str, args: &Args) -> ToolResult {
    match mode {
        "har" => har(state, args),
        // "summary"
        _ => summary(state),
    }
}

/// Export captured network bodies as a HAR 1.2 document, chronological.
fn har(state: &ServerState, args: &Args) -> ToolResult {
    let url_filter = arg_str(args, "url_contains");
    let bodies: Vec<NetworkBody> = state
        .capture
        .chronological_network_bodies()
        .into_iter()
        .filter(|body| url_filter.is_none_or(|needle| body.url.contains(needle)))
        .collect();

    let entries: Vec<Value> = bodies.iter().map(har_entry).collect();
    let document = json!({
        "log": {
            "version": "1.2",
            "creator": {"name": "gasoline", "version": VERSION},
            "entries": entries,
        }
    });

    if let Some(path) = arg_str(args, "path") {
        if !gasoline_paths::is_path_allowed(path) {
            return ToolError::new(
                ToolErrorCode::PathNotAllowed,
                format!("`{path}` is outside the allowed save locations"),
                "save under /tmp, the OS temp dir, or a relative path",
            )
            .with_param("path")
            .into_result();
        }
        let rendered = document.to_string();
        if let Err(err) = gasoline_paths::atomic_write(Path::new(path), rendered.as_bytes()) {
            return ToolError::new(
                ToolErrorCode::PathNotAllowed,
                format!("failed to write `{path}`: {err}"),
                "check the target directory exists and is writable",
            )
            .with_param("path")
            .into_result();
        }
        return ToolResult::json(&json!({"entries": bodies.len(), "path": path}));
    }

    ToolResult::json(&document)
}

fn har_entry(body: &NetworkBody) -> Value {
    let started = body
        .timestamp
        .as_ref()
        .and_then(|ts| ts.to_millis())
        .and_then(chrono::DateTime::from_timestamp_millis)
        .unwrap_or_default()
        .to_rfc3339();
    let request_headers = header_list(&body.request_headers);
    let response_headers = header_list(&body.response_headers);

    json!({
        "startedDateTime": started,
        "time": body.duration_ms,
        "request": {
            "method": &body.method,
            "url": &body.url,
            "httpVersion": "HTTP/1.1",
            "headers": request_headers,
            "postData": body.request_body.as_ref().map(|text| json!({
                "mimeType": body.content_type.clone().unwrap_or_default(),
                "text": text,
            })),
        },
        "response": {
            "status": body.status,
            "httpVersion": "HTTP/1.1",
            "headers": response_headers,
            "content": {
                "mimeType": body.content_type.clone().unwrap_or_default(),
                "text": &body.response_body,
            },
        },
        "_requestTruncated": body.request_truncated,
        "_responseTruncated": body.response_truncated,
        "_pending": body.is_pending(),
    })
}

fn header_list(headers: &serde_json::Map<String, Value>) -> Vec<Value> {
    headers
        .iter()
        .map(|(name, value)| {
            json!({
                "name": name,
                "value": value.as_str().map_or_else(|| value.to_string(), str::to_string),
            })
        })
        .collect()
}

/// A human-readable digest of the current capture state.
fn summary(state: &ServerState) -> ToolResult {
    let counts = state.capture.counts();
    let dropped = state.capture.dropped();
    let errors = state.capture.error_logs(5);
    let circuit = state.breaker.snapshot();

    let mut text = String::from("# Telemetry summary\n\n");
    text.push_str(&format!(
        "- logs: {} captured ({} dropped)\n",
        counts.logs, dropped.logs
    ));
    text.push_str(&format!(
        "- network bodies: {} captured ({} dropped)\n",
        counts.network_bodies, dropped.network_bodies
    ));
    text.push_str(&format!(
        "- websocket events: {} captured\n",
        counts.websocket_events
    ));
    text.push_str(&format!("- user actions: {} captured\n", counts.actions));
    text.push_str(&format!(
        "- circuit: {}\n",
        if circuit.circuit_open { "open" } else { "closed" }
    ));
    text.push_str(&format!(
        "- extension: {}\n",
        if state.extension_connected() {
            "connected"
        } else {
            "not connected"
        }
    ));
    if !errors.is_empty() {
        text.push_str("\n## Recent errors\n\n");
        for entry in &errors {
            text.push_str(&format!("- {}\n", entry.message));
        }
    }
    ToolResult::text(text)
}

#[cfg(test)]
#[path = "generate.test.rs"]
mod tests;
