//! Rate-limit circuit breaker gating extension telemetry ingestion.
//!
//! A tumbling one-second window counts ingested events. Windows over the
//! threshold grow a streak; enough consecutive hot windows open the circuit.
//! The circuit closes again only after it has been open for a minimum hold,
//! the streak has reset, and the event rate has stayed below the threshold
//! for a settle period. While open, ingestion rejects; MCP reads continue.

mod breaker;

pub use breaker::BreakerConfig;
pub use breaker::CircuitBreaker;
pub use breaker::CircuitSnapshot;
