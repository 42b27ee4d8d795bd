//! In-memory draw-mode session store.
//!
//! Holds the newest annotation session per tab (LRU-capped), named
//! multi-page sessions, and a TTL-expiring cache of per-annotation DOM
//! details. `wait_for_session` blocks until a session fresher than the
//! draw-started watermark arrives, so pre-existing stale sessions are never
//! handed out.

mod store;

pub use store::AnnotationStore;
pub use store::StoreConfig;
pub use store::WaitOutcome;
