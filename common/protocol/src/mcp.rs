//! MCP handshake and tool-listing types.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Protocol versions this server knows, newest first.
pub const PROTOCOL_VERSIONS: [&str; 3] = ["2025-06-18", "2025-03-26", "2024-11-05"];

/// Version negotiation: echo a known client version, otherwise answer with
/// the server's latest.
pub fn negotiate_version(client_version: Option<&str>) -> &'static str {
    client_version
        .and_then(|v| PROTOCOL_VERSIONS.into_iter().find(|known| *known == v))
        .unwrap_or(PROTOCOL_VERSIONS[0])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: Value,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

/// One tool advertised by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::PROTOCOL_VERSIONS;
    use super::negotiate_version;

    #[test]
    fn known_version_is_echoed() {
        assert_eq!(negotiate_version(Some("2024-11-05")), "2024-11-05");
    }

    #[test]
    fn unknown_version_gets_latest() {
        assert_eq!(negotiate_version(Some("1999-01-01")), PROTOCOL_VERSIONS[0]);
        assert_eq!(negotiate_version(None), PROTOCOL_VERSIONS[0]);
    }
}
