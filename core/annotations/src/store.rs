use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

use tokio::sync::watch;

use gasoline_protocol::AnnotationDetail;
use gasoline_protocol::AnnotationSession;
use gasoline_protocol::CorrelationId;
use gasoline_protocol::NamedAnnotationSession;

/// Store tuning.
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    /// Active per-tab sessions are capped here; the oldest timestamp is
    /// evicted first.
    pub session_cap: usize,
    /// Detail entries expire at insert time + this TTL.
    pub detail_ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            session_cap: 100,
            detail_ttl: Duration::from_secs(60),
        }
    }
}

/// Result of a blocking session wait.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome {
    Session(AnnotationSession),
    TimedOut,
    Closed,
}

struct Inner {
    sessions: HashMap<String, AnnotationSession>,
    named: HashMap<String, NamedAnnotationSession>,
    details: HashMap<CorrelationId, (AnnotationDetail, Instant)>,
    /// Epoch-ms watermark; sessions older than this are stale for waiters.
    last_draw_started_at: i64,
    closed: bool,
}

/// The annotation/draw-mode session store.
pub struct AnnotationStore {
    cfg: StoreConfig,
    inner: Mutex<Inner>,
    /// Bumped on every store/append/close so waiters re-check.
    notify: watch::Sender<u64>,
}

impl AnnotationStore {
    pub fn new(cfg: StoreConfig) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            cfg,
            inner: Mutex::new(Inner {
                sessions: HashMap::new(),
                named: HashMap::new(),
                details: HashMap::new(),
                last_draw_started_at: 0,
                closed: false,
            }),
            notify,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.notify.send_modify(|n| *n += 1);
    }

    /// Overwrite the current session for its tab; newest wins. Evicts the
    /// globally oldest session once the cap is exceeded.
    pub fn store_session(&self, session: AnnotationSession) {
        {
            let mut inner = self.lock();
            inner.sessions.insert(session.tab_id.clone(), session);
            if inner.sessions.len() > self.cfg.session_cap {
                let oldest = inner
                    .sessions
                    .values()
                    .min_by_key(|s| s.timestamp)
                    .map(|s| s.tab_id.clone());
                if let Some(tab_id) = oldest {
                    inner.sessions.remove(&tab_id);
                }
            }
        }
        self.bump();
    }

    pub fn get_session(&self, tab_id: &str) -> Option<AnnotationSession> {
        self.lock().sessions.get(tab_id).cloned()
    }

    /// The session with the highest timestamp across tabs.
    pub fn get_latest_session(&self) -> Option<AnnotationSession> {
        self.lock()
            .sessions
            .values()
            .max_by_key(|s| s.timestamp)
            .cloned()
    }

    /// Stamp the draw-started watermark; sessions completed before this
    /// instant are stale for [`AnnotationStore::wait_for_session`].
    pub fn mark_draw_started(&self) {
        self.lock().last_draw_started_at = chrono::Utc::now().timestamp_millis();
    }

    /// Epoch-ms watermark of the last draw start; 0 if never marked.
    pub fn last_draw_started_at_ms(&self) -> i64 {
        self.lock().last_draw_started_at
    }

    /// Block until a session at least as fresh as the watermark exists, the
    /// timeout passes, or the store closes.
    pub async fn wait_for_session(&self, timeout: Duration) -> WaitOutcome {
        let deadline = Instant::now() + timeout;
        let mut rx = self.notify.subscribe();
        loop {
            {
                let inner = self.lock();
                if inner.closed {
                    return WaitOutcome::Closed;
                }
                let fresh = inner
                    .sessions
                    .values()
                    .filter(|s| s.timestamp >= inner.last_draw_started_at)
                    .max_by_key(|s| s.timestamp)
                    .cloned();
                if let Some(session) = fresh {
                    return WaitOutcome::Session(session);
                }
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return WaitOutcome::TimedOut;
            }
            match tokio::time::timeout(remaining, rx.changed()).await {
                Err(_) => return WaitOutcome::TimedOut,
                Ok(Err(_)) => return WaitOutcome::Closed,
                Ok(Ok(())) => {}
            }
        }
    }

    /// Append a page to (or create) a named multi-page session. Page order
    /// is preserved.
    pub fn append_to_named_session(&self, name: &str, session: AnnotationSession) {
        {
            let mut inner = self.lock();
            inner
                .named
                .entry(name.to_string())
                .or_insert_with(|| NamedAnnotationSession {
                    name: name.to_string(),
                    pages: Vec::new(),
                })
                .pages
                .push(session);
        }
        self.bump();
    }

    pub fn get_named_session(&self, name: &str) -> Option<NamedAnnotationSession> {
        self.lock().named.get(name).cloned()
    }

    pub fn list_named_sessions(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().named.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn clear_named_session(&self, name: &str) -> bool {
        self.lock().named.remove(name).is_some()
    }

    /// Block until `name` gains a page beyond what it had at call time.
    pub async fn wait_for_named_session(&self, name: &str, timeout: Duration) -> WaitOutcome {
        let deadline = Instant::now() + timeout;
        let initial_pages = self
            .lock()
            .named
            .get(name)
            .map(|s| s.pages.len())
            .unwrap_or(0);
        let mut rx = self.notify.subscribe();
        loop {
            {
                let inner = self.lock();
                if inner.closed {
                    return WaitOutcome::Closed;
                }
                if let Some(named) = inner.named.get(name) {
                    if named.pages.len() > initial_pages {
                        if let Some(page) = named.pages.last() {
                            return WaitOutcome::Session(page.clone());
                        }
                    }
                }
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return WaitOutcome::TimedOut;
            }
            match tokio::time::timeout(remaining, rx.changed()).await {
                Err(_) => return WaitOutcome::TimedOut,
                Ok(Err(_)) => return WaitOutcome::Closed,
                Ok(Ok(())) => {}
            }
        }
    }

    pub fn store_detail(&self, detail: AnnotationDetail) {
        let mut inner = self.lock();
        inner
            .details
            .insert(detail.correlation_id.clone(), (detail, Instant::now()));
    }

    /// Lookup by correlation id; expired entries are treated as absent.
    pub fn get_detail(&self, correlation_id: &CorrelationId) -> Option<AnnotationDetail> {
        let inner = self.lock();
        inner.details.get(correlation_id).and_then(|(detail, at)| {
            if at.elapsed() < self.cfg.detail_ttl {
                Some(detail.clone())
            } else {
                None
            }
        })
    }

    /// Sweep expired details; driven by a server background task.
    pub fn gc_expired_details(&self) -> usize {
        let ttl = self.cfg.detail_ttl;
        let mut inner = self.lock();
        let before = inner.details.len();
        inner.details.retain(|_, (_, at)| at.elapsed() < ttl);
        before - inner.details.len()
    }

    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }

    /// Idempotent: unblocks all waiters. Writes keep succeeding afterwards
    /// so shutdown races never panic.
    pub fn close(&self) {
        {
            let mut inner = self.lock();
            if inner.closed {
                return;
            }
            inner.closed = true;
        }
        self.bump();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

#[cfg(test)]
#[path = "store.test.rs"]
mod tests;
