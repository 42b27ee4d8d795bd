//! The MCP request plane: JSON-RPC dispatch over HTTP or stdio.
//!
//! Framing errors answer as JSON-RPC errors; tool-level failures are
//! `isError: true` tool results. Notifications (requests without an `id`
//! field) never produce a response.

pub mod modes;
pub mod post;
pub mod schema;
pub mod tools;

use std::sync::Arc;

use serde_json::Value;
use serde_json::json;

use gasoline_protocol::JsonRpcRequest;
use gasoline_protocol::JsonRpcResponse;
use gasoline_protocol::TelemetryMode;
use gasoline_protocol::ToolError;
use gasoline_protocol::ToolResult;
use gasoline_protocol::jsonrpc::INVALID_PARAMS;
use gasoline_protocol::jsonrpc::INVALID_REQUEST;
use gasoline_protocol::jsonrpc::METHOD_NOT_FOUND;
use gasoline_protocol::mcp::InitializeResult;
use gasoline_protocol::mcp::ServerInfo;
use gasoline_protocol::mcp::negotiate_version;

use crate::SERVER_NAME;
use crate::VERSION;
use crate::state::ServerState;

use post::PostContext;
use tools::Args;

/// Dispatch one request. `None` means "no response" (notification).
pub async fn handle_request(
    state: &Arc<ServerState>,
    req: JsonRpcRequest,
    client_id: &str,
) -> Option<JsonRpcResponse> {
    let id = req.id.clone();
    if !req.has_valid_version() {
        return id.map(|id| {
            JsonRpcResponse::error(id, INVALID_REQUEST, "jsonrpc must be \"2.0\"")
        });
    }

    match req.method.as_str() {
        "initialize" => {
            let client_version = req
                .params
                .as_ref()
                .and_then(|params| params.get("protocolVersion"))
                .and_then(Value::as_str);
            let negotiated = negotiate_version(client_version);
            let result = InitializeResult {
                protocol_version: negotiated.to_string(),
                capabilities: json!({"tools": {"listChanged": false}}),
                server_info: ServerInfo {
                    name: SERVER_NAME.to_string(),
                    version: VERSION.to_string(),
                },
            };
            let id = id?;
            Some(JsonRpcResponse::success(
                id,
                serde_json::to_value(result).unwrap_or(Value::Null),
            ))
        }
        method if method.starts_with("notifications/") => None,
        "tools/list" => {
            let id = id?;
            Some(JsonRpcResponse::success(
                id,
                json!({"tools": schema::tool_specs()}),
            ))
        }
        "tools/call" => {
            let params = req.params.unwrap_or(Value::Null);
            let Some(name) = params.get("name").and_then(Value::as_str) else {
                return id.map(|id| {
                    JsonRpcResponse::error(id, INVALID_PARAMS, "missing tool name")
                });
            };
            if !modes::TOOLS.contains(&name) {
                let message = format!(
                    "unknown tool `{name}`; valid tools: {}",
                    modes::TOOLS.join(", ")
                );
                return id.map(|id| JsonRpcResponse::error(id, INVALID_PARAMS, message));
            }
            let arguments = params
                .get("arguments")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            let result = call_tool(state, client_id, name, arguments).await;
            let id = id?;
            Some(JsonRpcResponse::success(
                id,
                serde_json::to_value(result).unwrap_or(Value::Null),
            ))
        }
        other => {
            let message = format!("unknown method `{other}`");
            id.map(|id| JsonRpcResponse::error(id, METHOD_NOT_FOUND, message))
        }
    }
}

/// Run one tool call end to end: mode dispatch, handler, `_warnings`,
/// post-processing.
pub async fn call_tool(
    state: &Arc<ServerState>,
    client_id: &str,
    tool: &str,
    args: Args,
) -> ToolResult {
    state.clients.touch(client_id, None);

    let telemetry_override = args
        .get("telemetry_mode")
        .and_then(Value::as_str)
        .map(TelemetryMode::parse);
    let ctx_base = |interact| PostContext {
        tool: tool.to_string(),
        client_id: client_id.to_string(),
        telemetry_override,
        interact,
    };

    let Some(valid_modes) = modes::modes_for(tool) else {
        // Unreachable through handle_request; kept for direct callers.
        let err = ToolError::invalid_param("name", modes::TOOLS);
        return post::post_process(state, err.into_result(), &ctx_base(None));
    };
    let Some(mode) = modes::dispatch_mode(tool, &args) else {
        let err = ToolError::missing_param("what");
        return post::post_process(state, err.into_result(), &ctx_base(None));
    };
    if !valid_modes.contains(&mode.as_str()) {
        let err = ToolError::invalid_param("what", valid_modes);
        return post::post_process(state, err.into_result(), &ctx_base(None));
    }

    let known = match tool {
        modes::TOOL_OBSERVE => tools::observe::known_args(&mode),
        modes::TOOL_ANALYZE => tools::analyze::known_args(&mode),
        modes::TOOL_INTERACT => tools::interact::known_args(&mode),
        modes::TOOL_GENERATE => tools::generate::known_args(&mode),
        _ => tools::configure::known_args(&mode),
    };
    let warning = tools::unknown_field_warning(tool, &args, known);

    let (mut result, interact_meta) = match tool {
        modes::TOOL_OBSERVE => (tools::observe::handle(state, &mode, &args), None),
        modes::TOOL_ANALYZE => (tools::analyze::handle(state, &mode, &args).await, None),
        modes::TOOL_INTERACT => tools::interact::handle(state, &mode, &args).await,
        modes::TOOL_GENERATE => (tools::generate::handle(state, &mode, &args), None),
        _ => (tools::configure::handle(state, &mode, &args), None),
    };
    if let Some(warning) = warning {
        result.push_text(warning);
    }

    post::post_process(state, result, &ctx_base(interact_meta))
}

#[cfg(test)]
#[path = "mod.test.rs"]
mod tests;
