use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde_json::json;

use gasoline_protocol::Alert;
use gasoline_protocol::AlertSeverity;

/// Identical fingerprints within this window are dropped.
const DEDUP_WINDOW: Duration = Duration::from_secs(60);

/// Where emitted notification lines go. Connect mode injects the stdout
/// mutex writer; tests inject a recorder.
pub trait AlertSink: Send + Sync {
    fn write_line(&self, line: &str);
}

/// Event filter: everything, or a named category set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFilter {
    All,
    Only(BTreeSet<String>),
}

impl EventFilter {
    pub fn matches(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(set) => set.contains(category),
        }
    }
}

impl Serialize for EventFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_str("all"),
            Self::Only(set) => set.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for EventFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::String(s) if s == "all" => Ok(Self::All),
            serde_json::Value::Array(items) => {
                let set = items
                    .into_iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect();
                Ok(Self::Only(set))
            }
            other => Err(serde::de::Error::custom(format!(
                "expected \"all\" or a list of categories, got {other}"
            ))),
        }
    }
}

/// Alert emission policy, adjusted via `configure alerts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPolicy {
    pub enabled: bool,
    pub severity_min: AlertSeverity,
    pub events: EventFilter,
    pub throttle_seconds: u64,
    pub notification_max_per_minute: u32,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            severity_min: AlertSeverity::Warning,
            events: EventFilter::All,
            throttle_seconds: 5,
            notification_max_per_minute: 20,
        }
    }
}

/// What happened to one alert candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOutcome {
    Emitted,
    DroppedDisabled,
    DroppedSeverity,
    DroppedFiltered,
    DroppedDuplicate,
    DroppedRate,
    Throttled,
}

struct EmitState {
    recent_fingerprints: HashMap<String, Instant>,
    minute_start: Option<Instant>,
    minute_count: u32,
    last_emit_by_category: HashMap<String, Instant>,
    pending: Vec<Alert>,
}

/// The alert emitter. All methods are non-blocking.
pub struct AlertEmitter {
    policy: Mutex<AlertPolicy>,
    sink: Mutex<Option<Arc<dyn AlertSink>>>,
    state: Mutex<EmitState>,
}

impl AlertEmitter {
    pub fn new() -> Self {
        Self {
            policy: Mutex::new(AlertPolicy::default()),
            sink: Mutex::new(None),
            state: Mutex::new(EmitState {
                recent_fingerprints: HashMap::new(),
                minute_start: None,
                minute_count: 0,
                last_emit_by_category: HashMap::new(),
                pending: Vec::new(),
            }),
        }
    }

    pub fn set_sink(&self, sink: Arc<dyn AlertSink>) {
        let mut guard = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(sink);
    }

    pub fn set_policy(&self, policy: AlertPolicy) {
        let mut guard = self.policy.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = policy;
    }

    pub fn policy(&self) -> AlertPolicy {
        self.policy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run the drop ladder and emit at most one notification line.
    pub fn emit(&self, alert: Alert) -> EmitOutcome {
        self.emit_at(alert, Instant::now())
    }

    fn emit_at(&self, alert: Alert, now: Instant) -> EmitOutcome {
        let policy = self.policy();
        let sink = {
            let guard = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
            guard.clone()
        };
        let Some(sink) = sink else {
            return EmitOutcome::DroppedDisabled;
        };
        if !policy.enabled {
            return EmitOutcome::DroppedDisabled;
        }
        if alert.severity.rank() < policy.severity_min.rank() {
            return EmitOutcome::DroppedSeverity;
        }
        if !policy.events.matches(&alert.category) {
            return EmitOutcome::DroppedFiltered;
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let fingerprint = alert.effective_fingerprint();
        if let Some(last) = state.recent_fingerprints.get(&fingerprint) {
            if now.duration_since(*last) < DEDUP_WINDOW {
                return EmitOutcome::DroppedDuplicate;
            }
        }

        // Per-minute cap, reset on crossing the minute boundary.
        match state.minute_start {
            Some(start) if now.duration_since(start) < Duration::from_secs(60) => {}
            _ => {
                state.minute_start = Some(now);
                state.minute_count = 0;
            }
        }
        if state.minute_count >= policy.notification_max_per_minute {
            return EmitOutcome::DroppedRate;
        }

        // Throttle per category: batch instead of dropping.
        if let Some(last) = state.last_emit_by_category.get(&alert.category) {
            if now.duration_since(*last) < Duration::from_secs(policy.throttle_seconds) {
                state.pending.push(alert);
                return EmitOutcome::Throttled;
            }
        }

        Self::write_notification(&*sink, &alert);
        state.recent_fingerprints.insert(fingerprint, now);
        state
            .last_emit_by_category
            .insert(alert.category.clone(), now);
        state.minute_count += 1;
        EmitOutcome::Emitted
    }

    /// Flush the throttle batch. Never blocks.
    pub fn drain_pending(&self) -> usize {
        let sink = {
            let guard = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
            guard.clone()
        };
        let Some(sink) = sink else {
            return 0;
        };
        let now = Instant::now();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let pending = std::mem::take(&mut state.pending);
        let drained = pending.len();
        for alert in pending {
            Self::write_notification(&*sink, &alert);
            state
                .recent_fingerprints
                .insert(alert.effective_fingerprint(), now);
            state.last_emit_by_category.insert(alert.category, now);
            state.minute_count += 1;
        }
        drained
    }

    pub fn pending_count(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .len()
    }

    fn write_notification(sink: &dyn AlertSink, alert: &Alert) {
        let envelope = json!({
            "jsonrpc": "2.0",
            "method": "notifications/message",
            "params": {"alert": alert},
        });
        sink.write_line(&envelope.to_string());
    }
}

impl Default for AlertEmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "emitter.test.rs"]
mod tests;
