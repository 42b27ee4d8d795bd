//! Daemon lifecycle: state-dir resolution, pid/lock records, the takeover
//! protocol, signal-driven graceful shutdown, and the background tasks.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::VERSION;
use crate::http;
use crate::state::ServerState;

/// How long a takeover waits for the old daemon to release its port before
/// escalating to SIGTERM.
const TAKEOVER_WAIT: Duration = Duration::from_secs(5);

/// Cadence of the periodic circuit evaluation.
const CIRCUIT_EVAL_INTERVAL: Duration = Duration::from_secs(1);

/// Cadence of the annotation-detail GC sweep.
const DETAIL_GC_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub port: u16,
    pub state_dir: Option<PathBuf>,
    pub parallel: bool,
}

/// The on-disk claim of a port + state-dir + pid + version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonLock {
    pub pid: u32,
    pub port: u16,
    pub state_dir: String,
    pub version: String,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(
        "another daemon is running (pid {pid}, port {port}); --parallel requires an \
         explicitly isolated --state-dir"
    )]
    ParallelNeedsIsolatedStateDir { pid: u32, port: u16 },
    #[error(
        "ownership mismatch: lock records pid {lock_pid} but the pid file for port \
         {port} says {pidfile_pid}; refusing takeover"
    )]
    OwnershipMismatch {
        lock_pid: u32,
        pidfile_pid: u32,
        port: u16,
    },
    #[error("failed to bind 127.0.0.1:{port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Resolve the state dir: explicit flag, `GASOLINE_STATE_DIR`, XDG state
/// dir, then a temp-dir fallback.
pub fn resolve_state_dir(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir;
    }
    if let Ok(dir) = std::env::var("GASOLINE_STATE_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    if let Some(dir) = dirs::state_dir().or_else(dirs::data_local_dir) {
        return dir.join("gasoline");
    }
    std::env::temp_dir().join("gasoline")
}

pub fn lock_path(state_dir: &Path) -> PathBuf {
    state_dir.join("daemon.lock.json")
}

pub fn pid_path(state_dir: &Path, port: u16) -> PathBuf {
    state_dir.join(format!("gasoline-{port}.pid"))
}

/// Liveness probe via `kill(pid, 0)`. EPERM still means alive.
pub fn pid_alive(pid: u32) -> bool {
    if pid == 0 {
        return false;
    }
    // SAFETY: signal 0 performs error checking only.
    let rc = unsafe { libc::kill(pid as libc::pid_t, 0) };
    if rc == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

pub fn read_lock(state_dir: &Path) -> Option<DaemonLock> {
    let content = std::fs::read_to_string(lock_path(state_dir)).ok()?;
    serde_json::from_str(&content).ok()
}

pub fn read_pid_file(state_dir: &Path, port: u16) -> Option<u32> {
    let content = std::fs::read_to_string(pid_path(state_dir, port)).ok()?;
    content.trim().parse().ok()
}

/// Write the pid file and lock record atomically (temp + rename).
pub fn write_ownership(state_dir: &Path, port: u16) -> std::io::Result<()> {
    let pid = std::process::id();
    gasoline_paths::atomic_write(&pid_path(state_dir, port), format!("{pid}\n").as_bytes())?;
    let lock = DaemonLock {
        pid,
        port,
        state_dir: state_dir.to_string_lossy().into_owned(),
        version: VERSION.to_string(),
    };
    let rendered = serde_json::to_vec(&lock).map_err(std::io::Error::other)?;
    gasoline_paths::atomic_write(&lock_path(state_dir), &rendered)
}

pub fn remove_ownership(state_dir: &Path, port: u16) {
    let _ = std::fs::remove_file(pid_path(state_dir, port));
    let _ = std::fs::remove_file(lock_path(state_dir));
}

/// Enforce the lock protocol before binding: clean stale locks, guard
/// parallel mode, and take over a live daemon when asked to.
pub async fn prepare_launch(opts: &LaunchOptions, state_dir: &Path) -> Result<(), LifecycleError> {
    std::fs::create_dir_all(state_dir)?;

    let Some(lock) = read_lock(state_dir) else {
        return Ok(());
    };

    if !pid_alive(lock.pid) {
        tracing::info!(stale_pid = lock.pid, "removing stale daemon lock");
        remove_ownership(state_dir, lock.port);
        log_takeover(&lock, false);
        return Ok(());
    }

    if opts.parallel {
        // Parallel mode never overwrites another daemon's lock.
        if opts.state_dir.is_none() || lock.state_dir == state_dir.to_string_lossy() {
            return Err(LifecycleError::ParallelNeedsIsolatedStateDir {
                pid: lock.pid,
                port: lock.port,
            });
        }
        return Ok(());
    }

    // Takeover: the lock and pid file must agree on who owns the port.
    if let Some(pidfile_pid) = read_pid_file(state_dir, lock.port) {
        if pidfile_pid != lock.pid {
            return Err(LifecycleError::OwnershipMismatch {
                lock_pid: lock.pid,
                pidfile_pid,
                port: lock.port,
            });
        }
    }

    tracing::info!(
        existing_pid = lock.pid,
        existing_port = lock.port,
        "requesting graceful shutdown of the running daemon"
    );
    request_remote_shutdown(lock.port).await;

    let mut released = wait_for_exit(lock.pid, TAKEOVER_WAIT).await;
    if !released {
        tracing::warn!(pid = lock.pid, "graceful shutdown timed out; sending SIGTERM");
        // SAFETY: standard termination signal to a pid we verified we own
        // via the lock protocol.
        unsafe {
            libc::kill(lock.pid as libc::pid_t, libc::SIGTERM);
        }
        released = wait_for_exit(lock.pid, Duration::from_secs(2)).await;
    }
    if !released {
        tracing::warn!(pid = lock.pid, "old daemon survived SIGTERM; proceeding anyway");
    }

    remove_ownership(state_dir, lock.port);
    log_takeover(&lock, true);
    Ok(())
}

fn log_takeover(existing: &DaemonLock, takeover: bool) {
    tracing::info!(
        event = "daemon_takeover",
        existing_pid = existing.pid,
        existing_port = existing.port,
        new_pid = std::process::id(),
        state_dir = %existing.state_dir,
        takeover,
        "daemon ownership transition"
    );
}

async fn request_remote_shutdown(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{port}/shutdown");
    match client
        .post(&url)
        .timeout(Duration::from_secs(2))
        .send()
        .await
    {
        Ok(_) => {}
        Err(err) => tracing::debug!("remote shutdown request failed: {err}"),
    }
}

async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if !pid_alive(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    !pid_alive(pid)
}

/// Run the daemon until a signal or `/shutdown` stops it.
pub async fn run(opts: LaunchOptions) -> anyhow::Result<()> {
    let state_dir = resolve_state_dir(opts.state_dir.clone());
    prepare_launch(&opts, &state_dir).await?;

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", opts.port))
        .await
        .map_err(|source| LifecycleError::Bind {
            port: opts.port,
            source,
        })?;
    write_ownership(&state_dir, opts.port)?;

    let tag = gasoline_paths::compact_version_tag(VERSION);
    gasoline_paths::set_process_title(&format!("gasoline-{tag}"));

    let state = ServerState::new(state_dir.clone(), opts.port);

    // Honor a fresh cached-settings file from a just-restarted session.
    let now_ms = chrono::Utc::now().timestamp_millis();
    if let Some(cached) = crate::settings::load_if_fresh(&state_dir, now_ms) {
        if let Some(enabled) = cached.ai_web_pilot_enabled {
            state
                .pilot_enabled
                .store(enabled, std::sync::atomic::Ordering::Relaxed);
        }
    }

    spawn_background_tasks(&state);
    install_signal_handlers(&state);

    tracing::info!(port = opts.port, state_dir = %state_dir.display(), "daemon listening");

    let app = http::router(Arc::clone(&state));
    let shutdown = state.shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("draining before exit");
    state.queue.close();
    state.annotations.close();
    state.alerts.drain_pending();
    remove_ownership(&state_dir, opts.port);
    Ok(())
}

/// Periodic circuit evaluation and annotation-detail GC.
pub fn spawn_background_tasks(state: &Arc<ServerState>) {
    {
        let state = Arc::clone(state);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(CIRCUIT_EVAL_INTERVAL);
            loop {
                tokio::select! {
                    _ = state.shutdown.cancelled() => break,
                    _ = tick.tick() => state.breaker.evaluate_circuit(),
                }
            }
        });
    }
    {
        let state = Arc::clone(state);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(DETAIL_GC_INTERVAL);
            loop {
                tokio::select! {
                    _ = state.shutdown.cancelled() => break,
                    _ = tick.tick() => {
                        let swept = state.annotations.gc_expired_details();
                        if swept > 0 {
                            tracing::debug!(swept, "annotation detail gc");
                        }
                    }
                }
            }
        });
    }
}

fn install_signal_handlers(state: &Arc<ServerState>) {
    let state = Arc::clone(state);
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm = match tokio::signal::unix::signal(
                tokio::signal::unix::SignalKind::terminate(),
            ) {
                Ok(signal) => signal,
                Err(err) => {
                    tracing::warn!("failed to install SIGTERM handler: {err}");
                    let _ = ctrl_c.await;
                    state.shutdown.cancel();
                    return;
                }
            };
            tokio::select! {
                _ = ctrl_c => tracing::info!("received SIGINT"),
                _ = sigterm.recv() => tracing::info!("received SIGTERM"),
            }
        }
        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
        }
        state.shutdown.cancel();
    });
}

#[cfg(test)]
#[path = "lifecycle.test.rs"]
mod tests;
