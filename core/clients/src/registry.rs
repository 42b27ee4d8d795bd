use std::collections::HashMap;
use std::sync::PoisonError;
use std::sync::RwLock;

use serde::Serialize;

use gasoline_protocol::TelemetryCounts;

/// State tracked for one connected client.
#[derive(Debug, Clone, Serialize)]
pub struct ClientRecord {
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Epoch milliseconds.
    pub registered_at: i64,
    pub last_seen: i64,
    /// High-water marks into each ring buffer; monotone non-decreasing.
    pub cursors: TelemetryCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_tool: Option<String>,
}

/// Registry of connected clients, keyed by the client-id header.
pub struct ClientRegistry {
    inner: RwLock<HashMap<String, ClientRecord>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Create-or-touch a client record; used by `/mcp` and `POST /clients`.
    pub fn touch(&self, client_id: &str, cwd: Option<String>) {
        let now = chrono::Utc::now().timestamp_millis();
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let record = inner
            .entry(client_id.to_string())
            .or_insert_with(|| ClientRecord {
                client_id: client_id.to_string(),
                cwd: None,
                registered_at: now,
                last_seen: now,
                cursors: TelemetryCounts::default(),
                last_tool: None,
            });
        record.last_seen = now;
        if cwd.is_some() {
            record.cwd = cwd;
        }
    }

    /// Compute the delta since the client's previous call and advance its
    /// cursors to `current` in one atomic step.
    ///
    /// A brand-new client's first call reports everything already buffered
    /// as new.
    pub fn delta_and_advance(
        &self,
        client_id: &str,
        current: TelemetryCounts,
        tool: &str,
    ) -> TelemetryCounts {
        let now = chrono::Utc::now().timestamp_millis();
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let record = inner
            .entry(client_id.to_string())
            .or_insert_with(|| ClientRecord {
                client_id: client_id.to_string(),
                cwd: None,
                registered_at: now,
                last_seen: now,
                cursors: TelemetryCounts::default(),
                last_tool: None,
            });
        let delta = current.delta_since(&record.cursors);
        record.cursors = current;
        record.last_seen = now;
        record.last_tool = Some(tool.to_string());
        delta
    }

    pub fn get(&self, client_id: &str) -> Option<ClientRecord> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.get(client_id).cloned()
    }

    /// All records, ordered by registration time.
    pub fn list(&self) -> Vec<ClientRecord> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut records: Vec<ClientRecord> = inner.values().cloned().collect();
        records.sort_by_key(|r| (r.registered_at, r.client_id.clone()));
        records
    }

    pub fn remove(&self, client_id: &str) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.remove(client_id).is_some()
    }

    pub fn count(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.len()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry.test.rs"]
mod tests;
