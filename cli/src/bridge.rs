//! The CLI→daemon bridge: spawn a daemon when none answers, then talk MCP
//! over `POST /mcp` like any other client.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use anyhow::Context;
use anyhow::anyhow;
use anyhow::bail;
use serde_json::Value;
use serde_json::json;

use gasoline_protocol::JsonRpcResponse;
use gasoline_protocol::ToolResult;
use gasoline_server::CLI_CLIENT_ID;
use gasoline_server::CLIENT_HEADER;
use gasoline_server::lifecycle;

/// How long the bridge waits for a freshly spawned daemon to come up.
const SPAWN_WAIT: Duration = Duration::from_secs(5);

fn base_url(port: u16) -> String {
    format!("http://127.0.0.1:{port}")
}

async fn health_ok(client: &reqwest::Client, port: u16) -> bool {
    client
        .get(format!("{}/health", base_url(port)))
        .timeout(Duration::from_millis(750))
        .send()
        .await
        .map(|resp| resp.status().is_success())
        .unwrap_or(false)
}

/// Make sure a daemon answers on `port`, detach-spawning one if needed.
pub async fn ensure_daemon(port: u16, state_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    if health_ok(&client, port).await {
        return Ok(());
    }

    tracing::info!(port, "no daemon answering; spawning one");
    let exe = std::env::current_exe().context("cannot locate the gasoline binary")?;
    let mut command = std::process::Command::new(exe);
    command
        .arg("--daemon")
        .arg("--port")
        .arg(port.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    if let Some(dir) = &state_dir {
        command.arg("--state-dir").arg(dir);
    }
    command.spawn().context("failed to spawn the daemon")?;

    let deadline = tokio::time::Instant::now() + SPAWN_WAIT;
    while tokio::time::Instant::now() < deadline {
        if health_ok(&client, port).await {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(150)).await;
    }
    bail!("daemon did not become healthy on port {port} within {SPAWN_WAIT:?}")
}

/// POST one `tools/call` and unwrap the tool result.
pub async fn call_tool(
    port: u16,
    tool: &str,
    arguments: serde_json::Map<String, Value>,
    timeout_ms: Option<u64>,
) -> anyhow::Result<ToolResult> {
    let client = reqwest::Client::new();
    let mut arguments = arguments;
    if let Some(timeout_ms) = timeout_ms {
        arguments
            .entry("timeout_ms".to_string())
            .or_insert(json!(timeout_ms));
    }
    let body = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {"name": tool, "arguments": arguments},
    });
    // The HTTP deadline wraps the tool's own timeout with headroom.
    let http_timeout = Duration::from_millis(timeout_ms.unwrap_or(30_000) + 5_000);

    let response = client
        .post(format!("{}/mcp", base_url(port)))
        .header(CLIENT_HEADER, CLI_CLIENT_ID)
        .json(&body)
        .timeout(http_timeout)
        .send()
        .await
        .with_context(|| format!("POST /mcp on port {port} failed"))?;

    let envelope: JsonRpcResponse = response
        .json()
        .await
        .context("daemon returned a non-JSON-RPC body")?;
    if let Some(error) = envelope.error {
        bail!("JSON-RPC error {}: {}", error.code, error.message);
    }
    let result = envelope
        .result
        .ok_or_else(|| anyhow!("JSON-RPC response had neither result nor error"))?;
    serde_json::from_value(result).context("malformed tool result")
}

pub async fn fetch_doctor(port: u16) -> anyhow::Result<Value> {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/doctor", base_url(port)))
        .timeout(Duration::from_secs(3))
        .send()
        .await?;
    Ok(response.json().await?)
}

/// Stop a running daemon: graceful `/shutdown`, then SIGTERM with
/// `--force`.
pub async fn stop_daemon(
    port: u16,
    state_dir: Option<PathBuf>,
    force: bool,
) -> anyhow::Result<bool> {
    let client = reqwest::Client::new();
    let reachable = health_ok(&client, port).await;
    let state_dir = lifecycle::resolve_state_dir(state_dir);
    let lock = lifecycle::read_lock(&state_dir);

    if !reachable && lock.is_none() {
        return Ok(false);
    }

    if reachable {
        let _ = client
            .post(format!("{}/shutdown", base_url(port)))
            .timeout(Duration::from_secs(2))
            .send()
            .await;
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while tokio::time::Instant::now() < deadline {
            if !health_ok(&client, port).await {
                return Ok(true);
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
    }

    if force {
        if let Some(lock) = lock {
            if lifecycle::pid_alive(lock.pid) {
                tracing::warn!(pid = lock.pid, "forcing shutdown with SIGTERM");
                // SAFETY: standard termination signal to the recorded pid.
                unsafe {
                    libc::kill(lock.pid as libc::pid_t, libc::SIGTERM);
                }
            }
            lifecycle::remove_ownership(&state_dir, lock.port);
            return Ok(true);
        }
    }

    Ok(!health_ok(&client, port).await)
}
