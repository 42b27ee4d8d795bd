//! Connect mode: MCP over stdio.
//!
//! stdout carries newline-delimited JSON-RPC envelopes only; logs go to
//! stderr. A process-wide mutex makes every written line atomic so
//! concurrent responses and alert notifications never interleave.

use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;

use gasoline_alerts::AlertSink;
use gasoline_protocol::JsonRpcRequest;
use gasoline_protocol::JsonRpcResponse;

use crate::mcp;
use crate::state::ServerState;

/// The process-wide line-atomic stdout writer. Shared between the response
/// path and the alert emitter.
pub struct StdoutLineWriter {
    lock: Mutex<()>,
}

impl StdoutLineWriter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            lock: Mutex::new(()),
        })
    }

    /// Write one line atomically.
    pub fn write_line(&self, line: &str) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        let _ = writeln!(handle, "{line}");
        let _ = handle.flush();
    }
}

impl AlertSink for StdoutLineWriter {
    fn write_line(&self, line: &str) {
        StdoutLineWriter::write_line(self, line);
    }
}

/// Serve MCP over stdin/stdout until EOF or shutdown.
pub async fn run_connect(state: Arc<ServerState>) -> anyhow::Result<()> {
    let writer = StdoutLineWriter::new();
    state
        .alerts
        .set_sink(Arc::clone(&writer) as Arc<dyn AlertSink>);

    let client_id = format!("connect-{}", std::process::id());
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        let line = tokio::select! {
            _ = state.shutdown.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            // stdin closed: the client went away.
            break;
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        let request: JsonRpcRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(err) => {
                let response = JsonRpcResponse::parse_error(format!("invalid JSON-RPC: {err}"));
                write_response(&writer, &response);
                continue;
            }
        };

        // Handle each request on its own task so a slow interact command
        // does not serialize the whole session.
        let state = Arc::clone(&state);
        let writer = Arc::clone(&writer);
        let client_id = client_id.clone();
        tokio::spawn(async move {
            if let Some(response) = mcp::handle_request(&state, request, &client_id).await {
                write_response(&writer, &response);
            }
            state.alerts.drain_pending();
        });
    }

    state.shutdown.cancel();
    Ok(())
}

fn write_response(writer: &StdoutLineWriter, response: &JsonRpcResponse) {
    match serde_json::to_string(response) {
        Ok(line) => writer.write_line(&line),
        Err(err) => tracing::error!("failed to serialize response: {err}"),
    }
}
