//! Streaming alerts: a severity-filtered, deduplicated, rate-limited
//! `notifications/message` emitter.
//!
//! Alerts pass a drop ladder (enabled → severity → event filter → dedup →
//! per-minute cap → throttle) before a single JSON line is written to the
//! injected sink. In connect mode the sink is the process-wide stdout
//! writer, so notification lines interleave atomically with responses.

mod emitter;

pub use emitter::AlertEmitter;
pub use emitter::AlertPolicy;
pub use emitter::AlertSink;
pub use emitter::EmitOutcome;
pub use emitter::EventFilter;
