//! Multi-client registry and per-client telemetry cursors.
//!
//! Each MCP caller (identified by the `X-Gasoline-Client` header) owns a
//! high-water cursor per ring-buffer kind. After every successful tool call
//! the server computes the delta since the client's previous call and
//! advances the cursor atomically, so two clients never see each other's
//! deltas.

mod registry;

pub use registry::ClientRecord;
pub use registry::ClientRegistry;
