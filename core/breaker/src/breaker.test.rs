use std::time::Duration;
use std::time::Instant;

use pretty_assertions::assert_eq;

use super::BreakerConfig;
use super::CircuitBreaker;

fn fast_config() -> BreakerConfig {
    BreakerConfig {
        window: Duration::from_secs(1),
        threshold: 1000,
        open_after_windows: 1,
        hold_open_min: Duration::from_millis(100),
        settle: Duration::from_millis(100),
    }
}

#[test]
fn stays_closed_below_threshold() {
    let breaker = CircuitBreaker::new(fast_config());
    let t0 = Instant::now();
    breaker.record_events_at(500, t0);
    breaker.record_events_at(500, t0 + Duration::from_secs(2));
    assert!(!breaker.is_open());
}

#[test]
fn two_hot_windows_open_with_one_window_streak() {
    // 1500 events twice with a 2 s gap, threshold 1000,
    // open_after_windows 1.
    let breaker = CircuitBreaker::new(fast_config());
    let t0 = Instant::now();
    breaker.record_events_at(1500, t0);
    assert!(!breaker.is_open()); // window not yet rolled

    breaker.record_events_at(1500, t0 + Duration::from_secs(2));
    assert!(breaker.is_open());

    let snapshot = breaker.snapshot_at(t0 + Duration::from_secs(2));
    assert!(snapshot.circuit_open);
    assert_eq!(snapshot.reason.as_deref(), Some("rate_exceeded"));
}

#[test]
fn needs_full_streak_before_opening() {
    let cfg = BreakerConfig {
        open_after_windows: 2,
        ..fast_config()
    };
    let breaker = CircuitBreaker::new(cfg);
    let t0 = Instant::now();
    breaker.record_events_at(1500, t0);
    breaker.record_events_at(1500, t0 + Duration::from_secs(1)); // streak 1
    assert!(!breaker.is_open());
    breaker.record_events_at(1, t0 + Duration::from_secs(2)); // streak 2, opens
    assert!(breaker.is_open());
}

#[test]
fn quiet_window_resets_the_streak() {
    let cfg = BreakerConfig {
        open_after_windows: 2,
        ..fast_config()
    };
    let breaker = CircuitBreaker::new(cfg);
    let t0 = Instant::now();
    breaker.record_events_at(1500, t0);
    breaker.record_events_at(10, t0 + Duration::from_secs(1)); // hot tick, streak 1
    breaker.record_events_at(1500, t0 + Duration::from_secs(2)); // quiet tick, streak 0
    breaker.record_events_at(1, t0 + Duration::from_secs(3)); // hot tick, streak 1
    assert!(!breaker.is_open());
}

#[test]
fn closes_after_hold_streak_reset_and_settle() {
    let breaker = CircuitBreaker::new(fast_config());
    let t0 = Instant::now();
    breaker.record_events_at(1500, t0);
    breaker.record_events_at(1500, t0 + Duration::from_secs(1));
    assert!(breaker.is_open());

    breaker.record_events_at(1, t0 + Duration::from_secs(2));
    // The quiet window ticks here, resetting the streak and stamping
    // last_below_threshold_at.
    breaker.record_events_at(0, t0 + Duration::from_secs(3));
    assert!(breaker.is_open()); // settle not yet elapsed since the quiet tick

    breaker.evaluate_circuit_at(t0 + Duration::from_secs(4));
    assert!(!breaker.is_open());
}

#[test]
fn hold_open_minimum_is_respected() {
    let cfg = BreakerConfig {
        hold_open_min: Duration::from_secs(60),
        ..fast_config()
    };
    let breaker = CircuitBreaker::new(cfg);
    let t0 = Instant::now();
    breaker.record_events_at(1500, t0);
    breaker.record_events_at(1500, t0 + Duration::from_secs(1));
    breaker.record_events_at(0, t0 + Duration::from_secs(2));
    breaker.evaluate_circuit_at(t0 + Duration::from_secs(10));
    assert!(breaker.is_open()); // settle met, hold_open_min not
}

#[test]
fn force_close_clears_immediately() {
    let breaker = CircuitBreaker::new(fast_config());
    let t0 = Instant::now();
    breaker.record_events_at(1500, t0);
    breaker.record_events_at(1500, t0 + Duration::from_secs(1));
    assert!(breaker.is_open());

    breaker.force_close();
    assert!(!breaker.is_open());
    let snapshot = breaker.snapshot();
    assert_eq!(snapshot.rate_limit_streak, 0);
}
