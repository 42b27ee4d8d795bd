//! The browser-command queue and correlator.
//!
//! An at-most-once request/response channel keyed by a server-minted
//! correlation id. Producers (tool handlers) enqueue a pending command and
//! await its result with a deadline; the extension long-polls commands out
//! in FIFO order and posts results back. Late or duplicate completions are
//! shelved briefly, then discarded.

mod diagnostics;
mod queue;

pub use diagnostics::FAST_COMPLETION_MS;
pub use diagnostics::FastCompletionCheck;
pub use diagnostics::READINESS_STALE;
pub use diagnostics::diagnostic_warning;
pub use queue::AwaitOutcome;
pub use queue::CommandQueue;
pub use queue::PendingTicket;
pub use queue::QueueConfig;
pub use queue::QueueError;
