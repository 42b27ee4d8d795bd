//! The gasoline daemon: MCP request plane, HTTP surface, doctor readiness,
//! and daemon lifecycle.
//!
//! The daemon mediates between MCP clients (AI coding assistants, the CLI)
//! and a live browser instrumented by an extension. Telemetry flows in over
//! HTTP into ring buffers; browser commands flow out through the
//! correlation queue; every tool response is post-processed with per-client
//! telemetry deltas.

pub mod doctor;
pub mod http;
pub mod lifecycle;
pub mod mcp;
pub mod settings;
pub mod state;
pub mod stdio;

pub use state::ServerState;

/// Crate version, stamped into health output and the process title.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server name advertised on initialize.
pub const SERVER_NAME: &str = "gasoline";

/// Header identifying the MCP client; partitions telemetry cursors.
pub const CLIENT_HEADER: &str = "x-gasoline-client";

/// Header the extension sends on ingestion routes.
pub const EXTENSION_HEADER: &str = "x-gasoline-extension";

/// Client id used by the CLI self-bridge.
pub const CLI_CLIENT_ID: &str = "cli-1";
