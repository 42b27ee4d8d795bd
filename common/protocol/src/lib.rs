//! Wire types shared across the gasoline daemon.
//!
//! This crate defines the foundational protocol surface:
//! - JSON-RPC 2.0 framing and the MCP handshake types
//! - the tool result envelope and structured tool errors
//! - telemetry entry types ingested from the browser extension
//! - browser-command correlation types
//! - annotation / draw-mode session types
//! - doctor readiness and streaming-alert types

pub mod alert;
pub mod annotation;
pub mod command;
pub mod doctor;
pub mod envelope;
pub mod error;
pub mod jsonrpc;
pub mod mcp;
pub mod telemetry;

pub use alert::Alert;
pub use alert::AlertSeverity;
pub use annotation::Annotation;
pub use annotation::AnnotationDetail;
pub use annotation::AnnotationSession;
pub use annotation::BoundingRect;
pub use annotation::NamedAnnotationSession;
pub use command::CommandResult;
pub use command::CommandStatus;
pub use command::CorrelationId;
pub use command::DispatchedCommand;
pub use doctor::CheckStatus;
pub use doctor::DoctorCheck;
pub use doctor::DoctorReport;
pub use doctor::HealthStatus;
pub use envelope::ContentBlock;
pub use envelope::ToolResult;
pub use error::ToolError;
pub use error::ToolErrorCode;
pub use jsonrpc::JsonRpcError;
pub use jsonrpc::JsonRpcRequest;
pub use jsonrpc::JsonRpcResponse;
pub use jsonrpc::RequestId;
pub use telemetry::BufferKind;
pub use telemetry::EventTime;
pub use telemetry::TelemetryCounts;
pub use telemetry::TelemetryMode;
