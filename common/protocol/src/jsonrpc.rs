//! JSON-RPC 2.0 framing.
//!
//! A message with an `id` field is a request and must be answered; a message
//! without one is a notification and must not be. An explicit `id: null` is
//! still a request, answered with `id: null`. The distinction between
//! "absent" and "null" is load-bearing, so [`JsonRpcRequest::id`] is an
//! `Option<RequestId>` where `RequestId::Null` models the explicit null.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Version string required on every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// Malformed JSON, unreadable body, or unsupported content type.
pub const PARSE_ERROR: i64 = -32700;
/// Not a valid JSON-RPC 2.0 request object.
pub const INVALID_REQUEST: i64 = -32600;
/// Method does not exist.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Invalid method parameters.
pub const INVALID_PARAMS: i64 = -32602;
/// Internal error.
pub const INTERNAL_ERROR: i64 = -32603;

/// A request id: number, string, or explicit `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
    Null,
}

/// An incoming JSON-RPC request or notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    /// `None` means the field was absent (notification); `Some(Null)` means
    /// the client sent a literal `null`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// True iff the `id` field was absent entirely.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// True iff the envelope carries the required `"2.0"` version tag.
    pub fn has_valid_version(&self) -> bool {
        self.jsonrpc == JSONRPC_VERSION
    }
}

/// A JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

/// An outgoing JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Successful response for `id`.
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Error response for `id`.
    pub fn error(id: RequestId, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }

    /// Parse-level failure. Parse errors always respond with `id: null`.
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::error(RequestId::Null, PARSE_ERROR, message)
    }
}

#[cfg(test)]
#[path = "jsonrpc.test.rs"]
mod tests;
