//! Telemetry entry types ingested from the browser extension.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Request bodies are truncated upstream at 8 KiB.
pub const MAX_REQUEST_BODY_BYTES: usize = 8 * 1024;
/// Response bodies are truncated upstream at 16 KiB.
pub const MAX_RESPONSE_BODY_BYTES: usize = 16 * 1024;

/// An event timestamp: epoch milliseconds or an RFC3339 string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTime {
    Millis(i64),
    Text(String),
}

impl EventTime {
    pub fn now() -> Self {
        Self::Millis(chrono::Utc::now().timestamp_millis())
    }

    /// Epoch milliseconds, parsing RFC3339 text when needed.
    pub fn to_millis(&self) -> Option<i64> {
        match self {
            Self::Millis(ms) => Some(*ms),
            Self::Text(text) => chrono::DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.timestamp_millis()),
        }
    }
}

/// A console/log line. `level` is required; everything else is permissive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<EventTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_ids: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl LogEntry {
    pub fn is_error(&self) -> bool {
        self.level.eq_ignore_ascii_case("error")
    }
}

/// A captured request/response pair. `status == 0` means still pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkBody {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub request_headers: serde_json::Map<String, Value>,
    #[serde(default)]
    pub response_headers: serde_json::Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub duration_ms: f64,
    #[serde(default)]
    pub has_auth_header: bool,
    #[serde(default)]
    pub request_truncated: bool,
    #[serde(default)]
    pub response_truncated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<EventTime>,
}

impl NetworkBody {
    pub fn is_pending(&self) -> bool {
        self.status == 0
    }

    /// True if either body contains `needle`.
    pub fn body_contains(&self, needle: &str) -> bool {
        self.request_body
            .as_deref()
            .is_some_and(|body| body.contains(needle))
            || self
                .response_body
                .as_deref()
                .is_some_and(|body| body.contains(needle))
    }
}

/// A waterfall timing entry (request start/duration without bodies).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterfallEntry {
    pub url: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub start_ms: f64,
    #[serde(default)]
    pub duration_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<EventTime>,
}

/// Direction of a WebSocket message relative to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WsDirection {
    Sent,
    Received,
}

/// One WebSocket frame or lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSocketEvent {
    pub connection_id: String,
    pub direction: WsDirection,
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<EventTime>,
}

/// Connection-level WebSocket status (open/closed/error).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSocketStatusEvent {
    pub connection_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<EventTime>,
}

/// A user action captured by the extension (click, input, navigation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedAction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub selectors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<EventTime>,
}

/// A performance metrics frame at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    #[serde(default)]
    pub metrics: serde_json::Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<EventTime>,
}

/// A debug line from the extension itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionLogEntry {
    pub level: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<EventTime>,
}

/// The ring-buffer kinds exposed for reads and per-client cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferKind {
    Logs,
    NetworkBodies,
    NetworkWaterfall,
    WebsocketEvents,
    WebsocketStatus,
    Actions,
    PerformanceSnapshots,
    ExtensionLogs,
}

impl BufferKind {
    pub const ALL: [BufferKind; 8] = [
        BufferKind::Logs,
        BufferKind::NetworkBodies,
        BufferKind::NetworkWaterfall,
        BufferKind::WebsocketEvents,
        BufferKind::WebsocketStatus,
        BufferKind::Actions,
        BufferKind::PerformanceSnapshots,
        BufferKind::ExtensionLogs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BufferKind::Logs => "logs",
            BufferKind::NetworkBodies => "network_bodies",
            BufferKind::NetworkWaterfall => "network_waterfall",
            BufferKind::WebsocketEvents => "websocket_events",
            BufferKind::WebsocketStatus => "websocket_status",
            BufferKind::Actions => "actions",
            BufferKind::PerformanceSnapshots => "performance_snapshots",
            BufferKind::ExtensionLogs => "extension_logs",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl std::fmt::Display for BufferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Monotone per-kind write counters. Doubles as a per-client cursor and as
/// the delta between two cursor readings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounts {
    pub logs: u64,
    pub network_bodies: u64,
    pub network_waterfall: u64,
    pub websocket_events: u64,
    pub websocket_status: u64,
    pub actions: u64,
    pub performance_snapshots: u64,
    pub extension_logs: u64,
}

impl TelemetryCounts {
    pub fn get(&self, kind: BufferKind) -> u64 {
        match kind {
            BufferKind::Logs => self.logs,
            BufferKind::NetworkBodies => self.network_bodies,
            BufferKind::NetworkWaterfall => self.network_waterfall,
            BufferKind::WebsocketEvents => self.websocket_events,
            BufferKind::WebsocketStatus => self.websocket_status,
            BufferKind::Actions => self.actions,
            BufferKind::PerformanceSnapshots => self.performance_snapshots,
            BufferKind::ExtensionLogs => self.extension_logs,
        }
    }

    pub fn set(&mut self, kind: BufferKind, value: u64) {
        match kind {
            BufferKind::Logs => self.logs = value,
            BufferKind::NetworkBodies => self.network_bodies = value,
            BufferKind::NetworkWaterfall => self.network_waterfall = value,
            BufferKind::WebsocketEvents => self.websocket_events = value,
            BufferKind::WebsocketStatus => self.websocket_status = value,
            BufferKind::Actions => self.actions = value,
            BufferKind::PerformanceSnapshots => self.performance_snapshots = value,
            BufferKind::ExtensionLogs => self.extension_logs = value,
        }
    }

    /// Per-kind difference `self - older`, saturating at zero.
    pub fn delta_since(&self, older: &Self) -> Self {
        let mut delta = Self::default();
        for kind in BufferKind::ALL {
            delta.set(kind, self.get(kind).saturating_sub(older.get(kind)));
        }
        delta
    }

    pub fn total(&self) -> u64 {
        BufferKind::ALL.into_iter().map(|kind| self.get(kind)).sum()
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }
}

/// How much telemetry context is attached to tool responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryMode {
    #[default]
    Auto,
    Full,
    Off,
}

impl TelemetryMode {
    /// Unknown values fall back to `auto`; the override is advisory and a
    /// bad mode string must not fail an otherwise-valid call.
    pub fn parse(s: &str) -> Self {
        match s {
            "full" => Self::Full,
            "off" => Self::Off,
            _ => Self::Auto,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Full => "full",
            Self::Off => "off",
        }
    }
}

#[cfg(test)]
#[path = "telemetry.test.rs"]
mod tests;
