//! Telemetry capture: bounded ring buffers and the store that owns one per
//! buffer kind.
//!
//! Writers batch-append under a short write lock; readers take a snapshot
//! copy and filter on their own time. Overflow drops the oldest entries and
//! bumps a monotone dropped counter.

mod ring;
mod store;
mod validate;

pub use ring::RingBuffer;
pub use store::BufferCaps;
pub use store::CaptureStore;
pub use store::IngestOutcome;
pub use store::NetworkFilter;
pub use validate::MAX_ENTRY_BYTES;
pub use validate::entry_too_large;
