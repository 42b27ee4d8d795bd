//! The capture store: one ring buffer per telemetry kind, plus ingestion
//! validation and reader-side filtering.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use gasoline_protocol::BufferKind;
use gasoline_protocol::TelemetryCounts;
use gasoline_protocol::telemetry::EnhancedAction;
use gasoline_protocol::telemetry::ExtensionLogEntry;
use gasoline_protocol::telemetry::LogEntry;
use gasoline_protocol::telemetry::NetworkBody;
use gasoline_protocol::telemetry::PerformanceSnapshot;
use gasoline_protocol::telemetry::WaterfallEntry;
use gasoline_protocol::telemetry::WebSocketEvent;
use gasoline_protocol::telemetry::WebSocketStatusEvent;

use crate::ring::RingBuffer;
use crate::validate::entry_too_large;

/// Per-kind buffer capacities.
#[derive(Debug, Clone, Copy)]
pub struct BufferCaps {
    pub logs: usize,
    pub network_bodies: usize,
    pub network_waterfall: usize,
    pub websocket_events: usize,
    pub websocket_status: usize,
    pub actions: usize,
    pub performance_snapshots: usize,
    pub extension_logs: usize,
}

impl Default for BufferCaps {
    fn default() -> Self {
        Self {
            logs: 1000,
            network_bodies: 500,
            network_waterfall: 1000,
            websocket_events: 500,
            websocket_status: 100,
            actions: 500,
            performance_snapshots: 100,
            extension_logs: 500,
        }
    }
}

/// Outcome of a batch ingest. Oversize or malformed entries do not stop a
/// batch; they are counted and the remainder is accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    pub accepted: usize,
    pub rejected: usize,
}

/// Reader-side filter for network reads. Applied to a snapshot, never to
/// the writer path.
#[derive(Debug, Clone, Default)]
pub struct NetworkFilter {
    pub url_contains: Option<String>,
    pub method: Option<String>,
    pub status_min: Option<u16>,
    pub status_max: Option<u16>,
    pub body_contains: Option<String>,
}

impl NetworkFilter {
    pub fn matches(&self, body: &NetworkBody) -> bool {
        if let Some(needle) = &self.url_contains {
            if !body.url.contains(needle.as_str()) {
                return false;
            }
        }
        if let Some(method) = &self.method {
            if !body.method.eq_ignore_ascii_case(method) {
                return false;
            }
        }
        if let Some(min) = self.status_min {
            if body.status < min {
                return false;
            }
        }
        if let Some(max) = self.status_max {
            if body.status > max {
                return false;
            }
        }
        if let Some(needle) = &self.body_contains {
            if !body.body_contains(needle) {
                return false;
            }
        }
        true
    }
}

/// Owns every telemetry ring buffer. Tool handlers borrow read-only views;
/// the ingestion handlers are the only writers.
pub struct CaptureStore {
    logs: RingBuffer<LogEntry>,
    network_bodies: RingBuffer<NetworkBody>,
    network_waterfall: RingBuffer<WaterfallEntry>,
    websocket_events: RingBuffer<WebSocketEvent>,
    websocket_status: RingBuffer<WebSocketStatusEvent>,
    actions: RingBuffer<EnhancedAction>,
    performance_snapshots: RingBuffer<PerformanceSnapshot>,
    extension_logs: RingBuffer<ExtensionLogEntry>,
}

impl CaptureStore {
    pub fn new() -> Self {
        Self::with_caps(BufferCaps::default())
    }

    pub fn with_caps(caps: BufferCaps) -> Self {
        Self {
            logs: RingBuffer::new(caps.logs),
            network_bodies: RingBuffer::new(caps.network_bodies),
            network_waterfall: RingBuffer::new(caps.network_waterfall),
            websocket_events: RingBuffer::new(caps.websocket_events),
            websocket_status: RingBuffer::new(caps.websocket_status),
            actions: RingBuffer::new(caps.actions),
            performance_snapshots: RingBuffer::new(caps.performance_snapshots),
            extension_logs: RingBuffer::new(caps.extension_logs),
        }
    }

    // ---- ingestion ----

    pub fn ingest_logs(&self, raw: Vec<Value>) -> IngestOutcome {
        ingest_into(&self.logs, raw)
    }

    pub fn ingest_network_bodies(&self, raw: Vec<Value>) -> IngestOutcome {
        ingest_into(&self.network_bodies, raw)
    }

    pub fn ingest_waterfall(&self, raw: Vec<Value>) -> IngestOutcome {
        ingest_into(&self.network_waterfall, raw)
    }

    pub fn ingest_websocket_events(&self, raw: Vec<Value>) -> IngestOutcome {
        ingest_into(&self.websocket_events, raw)
    }

    pub fn ingest_websocket_status(&self, raw: Vec<Value>) -> IngestOutcome {
        ingest_into(&self.websocket_status, raw)
    }

    pub fn ingest_actions(&self, raw: Vec<Value>) -> IngestOutcome {
        ingest_into(&self.actions, raw)
    }

    pub fn ingest_performance_snapshots(&self, raw: Vec<Value>) -> IngestOutcome {
        ingest_into(&self.performance_snapshots, raw)
    }

    pub fn ingest_extension_logs(&self, raw: Vec<Value>) -> IngestOutcome {
        ingest_into(&self.extension_logs, raw)
    }

    /// Route a batch by kind (the `/sync` aggregated envelope).
    pub fn ingest_kind(&self, kind: BufferKind, raw: Vec<Value>) -> IngestOutcome {
        match kind {
            BufferKind::Logs => self.ingest_logs(raw),
            BufferKind::NetworkBodies => self.ingest_network_bodies(raw),
            BufferKind::NetworkWaterfall => self.ingest_waterfall(raw),
            BufferKind::WebsocketEvents => self.ingest_websocket_events(raw),
            BufferKind::WebsocketStatus => self.ingest_websocket_status(raw),
            BufferKind::Actions => self.ingest_actions(raw),
            BufferKind::PerformanceSnapshots => self.ingest_performance_snapshots(raw),
            BufferKind::ExtensionLogs => self.ingest_extension_logs(raw),
        }
    }

    // ---- reads (snapshot copies, newest first) ----

    pub fn recent_logs(&self, limit: usize, level: Option<&str>) -> Vec<LogEntry> {
        let snapshot = self.logs.snapshot_newest_first(0);
        let filtered = snapshot
            .into_iter()
            .filter(|entry| level.is_none_or(|lvl| entry.level.eq_ignore_ascii_case(lvl)));
        if limit == 0 {
            filtered.collect()
        } else {
            filtered.take(limit).collect()
        }
    }

    pub fn error_logs(&self, limit: usize) -> Vec<LogEntry> {
        self.recent_logs(limit, Some("error"))
    }

    pub fn recent_network_bodies(&self, limit: usize, filter: &NetworkFilter) -> Vec<NetworkBody> {
        let snapshot = self.network_bodies.snapshot_newest_first(0);
        let filtered = snapshot.into_iter().filter(|body| filter.matches(body));
        if limit == 0 {
            filtered.collect()
        } else {
            filtered.take(limit).collect()
        }
    }

    /// Insertion-order bodies for chronological consumers (HAR export).
    pub fn chronological_network_bodies(&self) -> Vec<NetworkBody> {
        self.network_bodies.snapshot_chronological()
    }

    pub fn recent_waterfall(&self, limit: usize) -> Vec<WaterfallEntry> {
        self.network_waterfall.snapshot_newest_first(limit)
    }

    pub fn recent_websocket_events(
        &self,
        limit: usize,
        connection_id: Option<&str>,
    ) -> Vec<WebSocketEvent> {
        let snapshot = self.websocket_events.snapshot_newest_first(0);
        let filtered = snapshot
            .into_iter()
            .filter(|event| connection_id.is_none_or(|id| event.connection_id == id));
        if limit == 0 {
            filtered.collect()
        } else {
            filtered.take(limit).collect()
        }
    }

    pub fn recent_websocket_status(&self, limit: usize) -> Vec<WebSocketStatusEvent> {
        self.websocket_status.snapshot_newest_first(limit)
    }

    pub fn recent_actions(&self, limit: usize) -> Vec<EnhancedAction> {
        self.actions.snapshot_newest_first(limit)
    }

    pub fn recent_performance_snapshots(&self, limit: usize) -> Vec<PerformanceSnapshot> {
        self.performance_snapshots.snapshot_newest_first(limit)
    }

    pub fn recent_extension_logs(&self, limit: usize) -> Vec<ExtensionLogEntry> {
        self.extension_logs.snapshot_newest_first(limit)
    }

    /// Unified raw read for the `/telemetry` endpoint.
    pub fn read_raw(&self, kind: BufferKind, limit: usize) -> Vec<Value> {
        fn to_values<T: Serialize>(items: Vec<T>) -> Vec<Value> {
            items
                .into_iter()
                .filter_map(|item| serde_json::to_value(item).ok())
                .collect()
        }
        match kind {
            BufferKind::Logs => to_values(self.logs.snapshot_newest_first(limit)),
            BufferKind::NetworkBodies => {
                to_values(self.network_bodies.snapshot_newest_first(limit))
            }
            BufferKind::NetworkWaterfall => {
                to_values(self.network_waterfall.snapshot_newest_first(limit))
            }
            BufferKind::WebsocketEvents => {
                to_values(self.websocket_events.snapshot_newest_first(limit))
            }
            BufferKind::WebsocketStatus => {
                to_values(self.websocket_status.snapshot_newest_first(limit))
            }
            BufferKind::Actions => to_values(self.actions.snapshot_newest_first(limit)),
            BufferKind::PerformanceSnapshots => {
                to_values(self.performance_snapshots.snapshot_newest_first(limit))
            }
            BufferKind::ExtensionLogs => {
                to_values(self.extension_logs.snapshot_newest_first(limit))
            }
        }
    }

    // ---- counters ----

    /// Monotone written-count per kind; the per-client cursor basis.
    pub fn counts(&self) -> TelemetryCounts {
        TelemetryCounts {
            logs: self.logs.total_written(),
            network_bodies: self.network_bodies.total_written(),
            network_waterfall: self.network_waterfall.total_written(),
            websocket_events: self.websocket_events.total_written(),
            websocket_status: self.websocket_status.total_written(),
            actions: self.actions.total_written(),
            performance_snapshots: self.performance_snapshots.total_written(),
            extension_logs: self.extension_logs.total_written(),
        }
    }

    /// Overflow-drop counters per kind.
    pub fn dropped(&self) -> TelemetryCounts {
        TelemetryCounts {
            logs: self.logs.dropped(),
            network_bodies: self.network_bodies.dropped(),
            network_waterfall: self.network_waterfall.dropped(),
            websocket_events: self.websocket_events.dropped(),
            websocket_status: self.websocket_status.dropped(),
            actions: self.actions.dropped(),
            performance_snapshots: self.performance_snapshots.dropped(),
            extension_logs: self.extension_logs.dropped(),
        }
    }

    /// Buffered item counts per kind (for diagnostics).
    pub fn lengths(&self) -> TelemetryCounts {
        TelemetryCounts {
            logs: self.logs.len() as u64,
            network_bodies: self.network_bodies.len() as u64,
            network_waterfall: self.network_waterfall.len() as u64,
            websocket_events: self.websocket_events.len() as u64,
            websocket_status: self.websocket_status.len() as u64,
            actions: self.actions.len() as u64,
            performance_snapshots: self.performance_snapshots.len() as u64,
            extension_logs: self.extension_logs.len() as u64,
        }
    }

    pub fn clear(&self, kind: BufferKind) {
        match kind {
            BufferKind::Logs => self.logs.clear(),
            BufferKind::NetworkBodies => self.network_bodies.clear(),
            BufferKind::NetworkWaterfall => self.network_waterfall.clear(),
            BufferKind::WebsocketEvents => self.websocket_events.clear(),
            BufferKind::WebsocketStatus => self.websocket_status.clear(),
            BufferKind::Actions => self.actions.clear(),
            BufferKind::PerformanceSnapshots => self.performance_snapshots.clear(),
            BufferKind::ExtensionLogs => self.extension_logs.clear(),
        }
    }

    pub fn clear_all(&self) {
        for kind in BufferKind::ALL {
            self.clear(kind);
        }
    }
}

impl Default for CaptureStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate and append a batch: each element must deserialize into the
/// buffer's entry type and stay under the size cap.
fn ingest_into<T: Clone + DeserializeOwned>(
    buffer: &RingBuffer<T>,
    raw: Vec<Value>,
) -> IngestOutcome {
    let mut outcome = IngestOutcome::default();
    let mut batch = Vec::with_capacity(raw.len());
    for value in raw {
        if entry_too_large(&value) {
            outcome.rejected += 1;
            continue;
        }
        match serde_json::from_value::<T>(value) {
            Ok(entry) => batch.push(entry),
            Err(err) => {
                tracing::debug!("rejected telemetry entry: {err}");
                outcome.rejected += 1;
            }
        }
    }
    outcome.accepted = buffer.extend(batch);
    outcome
}

#[cfg(test)]
#[path = "store.test.rs"]
mod tests;
