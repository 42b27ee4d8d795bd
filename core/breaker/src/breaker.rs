use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

use serde::Serialize;

/// Breaker tuning. Production defaults; tests narrow them.
#[derive(Debug, Clone, Copy)]
pub struct BreakerConfig {
    /// Window length for the tumbling event counter.
    pub window: Duration,
    /// Events per window above which the window counts toward the streak.
    pub threshold: u64,
    /// Consecutive hot windows before the circuit opens.
    pub open_after_windows: u32,
    /// Minimum time the circuit stays open once tripped.
    pub hold_open_min: Duration,
    /// Quiet time below threshold required before closing.
    pub settle: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(1),
            threshold: 1000,
            open_after_windows: 3,
            hold_open_min: Duration::from_secs(5),
            settle: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone)]
enum Circuit {
    Closed,
    Open { reason: String, opened_at: Instant },
}

#[derive(Debug)]
struct State {
    window_start: Instant,
    window_event_count: u64,
    rate_limit_streak: u32,
    last_below_threshold_at: Option<Instant>,
    circuit: Circuit,
}

/// Serializable view for health reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitSnapshot {
    pub circuit_open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_for_ms: Option<u64>,
    pub rate_limit_streak: u32,
    pub window_event_count: u64,
}

/// The three-phase circuit plus its tumbling window counter.
pub struct CircuitBreaker {
    cfg: BreakerConfig,
    state: Mutex<State>,
}

impl CircuitBreaker {
    pub fn new(cfg: BreakerConfig) -> Self {
        Self {
            cfg,
            state: Mutex::new(State {
                window_start: Instant::now(),
                window_event_count: 0,
                rate_limit_streak: 0,
                last_below_threshold_at: None,
                circuit: Circuit::Closed,
            }),
        }
    }

    /// Record `n` ingested events, rolling the window when it has elapsed.
    pub fn record_events(&self, n: u64) {
        self.record_events_at(n, Instant::now());
    }

    pub fn record_events_at(&self, n: u64, now: Instant) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if now.duration_since(state.window_start) >= self.cfg.window {
            Self::tick_rate_window(&self.cfg, &mut state, now);
            state.window_event_count = 0;
            state.window_start = now;
        }
        state.window_event_count += n;
        self.evaluate_locked(&mut state, now);
    }

    /// Periodic evaluation. Does not roll the window: only observed events
    /// tick it, so `last_below_threshold_at` ages while ingestion is quiet
    /// and the settle condition can be met.
    pub fn evaluate_circuit(&self) {
        self.evaluate_circuit_at(Instant::now());
    }

    pub fn evaluate_circuit_at(&self, now: Instant) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.evaluate_locked(&mut state, now);
    }

    fn tick_rate_window(cfg: &BreakerConfig, state: &mut State, now: Instant) {
        if state.window_event_count > cfg.threshold {
            state.rate_limit_streak += 1;
        } else {
            state.last_below_threshold_at = Some(now);
            state.rate_limit_streak = 0;
        }
    }

    fn evaluate_locked(&self, state: &mut State, now: Instant) {
        match &state.circuit {
            Circuit::Closed => {
                if state.rate_limit_streak >= self.cfg.open_after_windows {
                    tracing::warn!(
                        streak = state.rate_limit_streak,
                        "circuit opened: rate_exceeded"
                    );
                    state.circuit = Circuit::Open {
                        reason: "rate_exceeded".to_string(),
                        opened_at: now,
                    };
                }
            }
            Circuit::Open { opened_at, .. } => {
                let held_long_enough =
                    now.duration_since(*opened_at) >= self.cfg.hold_open_min;
                let settled = state
                    .last_below_threshold_at
                    .is_some_and(|below| now.duration_since(below) >= self.cfg.settle);
                if state.rate_limit_streak == 0 && held_long_enough && settled {
                    tracing::info!("circuit closed after settle");
                    state.circuit = Circuit::Closed;
                }
            }
        }
    }

    /// Force-close (`configure clear circuit`). Resets the streak.
    pub fn force_close(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.circuit = Circuit::Closed;
        state.rate_limit_streak = 0;
        state.window_event_count = 0;
    }

    pub fn is_open(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(state.circuit, Circuit::Open { .. })
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        self.snapshot_at(Instant::now())
    }

    pub fn snapshot_at(&self, now: Instant) -> CircuitSnapshot {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match &state.circuit {
            Circuit::Closed => CircuitSnapshot {
                circuit_open: false,
                reason: None,
                open_for_ms: None,
                rate_limit_streak: state.rate_limit_streak,
                window_event_count: state.window_event_count,
            },
            Circuit::Open { reason, opened_at } => CircuitSnapshot {
                circuit_open: true,
                reason: Some(reason.clone()),
                open_for_ms: Some(now.duration_since(*opened_at).as_millis() as u64),
                rate_limit_streak: state.rate_limit_streak,
                window_event_count: state.window_event_count,
            },
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}

#[cfg(test)]
#[path = "breaker.test.rs"]
mod tests;
