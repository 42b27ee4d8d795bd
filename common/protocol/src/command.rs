//! Browser-command correlation types.
//!
//! Tool handlers enqueue commands; the extension long-polls for them and
//! later posts a [`CommandResult`] tagged with the server-minted
//! [`CorrelationId`].

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Server-minted opaque token tying a command to its eventual result.
///
/// Format: `<tool>_<epochms>_<rand>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    /// Mint a fresh id for `tool`.
    pub fn mint(tool: &str) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        let suffix: u32 = rand::random::<u32>() & 0x00ff_ffff;
        Self(format!("{tool}_{now}_{suffix:06x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CorrelationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Terminal status of a browser command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Complete,
    Error,
    Timeout,
    Expired,
}

impl CommandStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Error => "error",
            Self::Timeout => "timeout",
            Self::Expired => "expired",
        }
    }

    /// Timeout and expired are the hard failures the diagnostics track.
    pub fn is_hard_failure(&self) -> bool {
        matches!(self, Self::Timeout | Self::Expired)
    }
}

/// The result the extension posts back for a dispatched command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub correlation_id: CorrelationId,
    pub status: CommandStatus,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub elapsed_ms: u64,
    #[serde(default, rename = "final")]
    pub is_final: bool,
}

impl CommandResult {
    pub fn complete(correlation_id: CorrelationId, payload: Value, elapsed_ms: u64) -> Self {
        Self {
            correlation_id,
            status: CommandStatus::Complete,
            payload,
            elapsed_ms,
            is_final: true,
        }
    }
}

/// The wire shape handed to the extension on long-poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchedCommand {
    pub correlation_id: CorrelationId,
    pub tool: String,
    #[serde(default)]
    pub args: Value,
    pub enqueued_at_ms: i64,
}

#[cfg(test)]
#[path = "command.test.rs"]
mod tests;
