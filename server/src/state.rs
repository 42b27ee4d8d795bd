//! Shared daemon state.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use serde::Deserialize;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use gasoline_alerts::AlertEmitter;
use gasoline_annotations::AnnotationStore;
use gasoline_breaker::CircuitBreaker;
use gasoline_capture::CaptureStore;
use gasoline_clients::ClientRegistry;
use gasoline_commands::CommandQueue;
use gasoline_protocol::TelemetryMode;

use crate::http::screenshots::ScreenshotLimiter;

/// The extension is considered connected while its last poll is younger
/// than this.
pub const EXTENSION_STALE_AFTER: Duration = Duration::from_secs(5);

/// Queue depth at which readiness degrades.
pub const QUEUE_DEPTH_SOFT_CAP: usize = 5;

/// Runtime-tunable server settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub telemetry_default: TelemetryMode,
    /// The fixed extension origin allowed through CORS.
    pub extension_origin: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            telemetry_default: TelemetryMode::Auto,
            extension_origin: "chrome-extension://gasoline-devtools".to_string(),
        }
    }
}

/// The process-wide "altered environment" banner set by `configure
/// security`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityMode {
    pub mode: String,
    #[serde(default)]
    pub rewrites_applied: Vec<String>,
}

/// The browser tab currently tracked by the extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedTab {
    pub tab_id: String,
    #[serde(default)]
    pub url: String,
}

/// Everything the HTTP handlers and the MCP dispatcher share.
pub struct ServerState {
    pub capture: Arc<CaptureStore>,
    pub queue: Arc<CommandQueue>,
    pub breaker: Arc<CircuitBreaker>,
    pub annotations: Arc<AnnotationStore>,
    pub clients: Arc<ClientRegistry>,
    pub alerts: Arc<AlertEmitter>,
    pub screenshots: ScreenshotLimiter,
    pub settings: RwLock<ServerSettings>,
    pub security: RwLock<Option<SecurityMode>>,
    pub tracked_tab: RwLock<Option<TrackedTab>>,
    /// Last CSP-blockage note reported by the extension.
    pub csp_blocked: RwLock<Option<String>>,
    pub pilot_enabled: AtomicBool,
    /// True after an interact command ended in timeout/expired; cleared on
    /// the next success. Feeds `ready_for_interaction`.
    pub recent_hard_failure: AtomicBool,
    last_extension_poll: Mutex<Option<Instant>>,
    pub started_at: Instant,
    pub state_dir: PathBuf,
    pub port: u16,
    pub shutdown: CancellationToken,
}

impl ServerState {
    pub fn new(state_dir: PathBuf, port: u16) -> Arc<Self> {
        Arc::new(Self {
            capture: Arc::new(CaptureStore::new()),
            queue: Arc::new(CommandQueue::default()),
            breaker: Arc::new(CircuitBreaker::default()),
            annotations: Arc::new(AnnotationStore::default()),
            clients: Arc::new(ClientRegistry::new()),
            alerts: Arc::new(AlertEmitter::new()),
            screenshots: ScreenshotLimiter::default(),
            settings: RwLock::new(ServerSettings::default()),
            security: RwLock::new(None),
            tracked_tab: RwLock::new(None),
            csp_blocked: RwLock::new(None),
            pilot_enabled: AtomicBool::new(true),
            recent_hard_failure: AtomicBool::new(false),
            last_extension_poll: Mutex::new(None),
            started_at: Instant::now(),
            state_dir,
            port,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn record_extension_poll(&self) {
        let mut guard = self
            .last_extension_poll
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Instant::now());
    }

    pub fn extension_poll_age(&self) -> Option<Duration> {
        let guard = self
            .last_extension_poll
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        guard.map(|at| at.elapsed())
    }

    pub fn extension_connected(&self) -> bool {
        self.extension_poll_age()
            .is_some_and(|age| age <= EXTENSION_STALE_AFTER)
    }

    /// Age of the last draw start, if any.
    pub fn last_draw_age(&self) -> Option<Duration> {
        let marked = self.annotations.last_draw_started_at_ms();
        if marked <= 0 {
            return None;
        }
        let now = chrono::Utc::now().timestamp_millis();
        Some(Duration::from_millis(now.saturating_sub(marked).max(0) as u64))
    }

    /// True iff the extension is connected, the circuit is closed, the
    /// queue is shallow, and no recent command failed hard.
    pub fn ready_for_interaction(&self) -> bool {
        self.extension_connected()
            && !self.breaker.is_open()
            && self.queue.depth() < QUEUE_DEPTH_SOFT_CAP
            && !self.recent_hard_failure.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn telemetry_default(&self) -> TelemetryMode {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .telemetry_default
    }

    pub fn set_telemetry_default(&self, mode: TelemetryMode) {
        self.settings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .telemetry_default = mode;
    }

    pub fn security_mode(&self) -> Option<SecurityMode> {
        self.security
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_security_mode(&self, mode: Option<SecurityMode>) {
        *self.security.write().unwrap_or_else(PoisonError::into_inner) = mode;
    }

    pub fn csp_note(&self) -> Option<String> {
        self.csp_blocked
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_csp_note(&self, note: Option<String>) {
        *self
            .csp_blocked
            .write()
            .unwrap_or_else(PoisonError::into_inner) = note;
    }

    pub fn tracked_tab(&self) -> Option<TrackedTab> {
        self.tracked_tab
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_tracked_tab(&self, tab: Option<TrackedTab>) {
        *self
            .tracked_tab
            .write()
            .unwrap_or_else(PoisonError::into_inner) = tab;
    }
}
