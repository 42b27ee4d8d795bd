//! The `gasoline` binary: daemon launcher, stop/check/doctor commands, the
//! stdio connect mode, and the tool self-bridge that POSTs `tools/call` to
//! a (possibly freshly spawned) daemon.

mod bridge;
mod format;
mod invocation;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use gasoline_server::lifecycle;
use gasoline_server::lifecycle::LaunchOptions;
use gasoline_server::state::ServerState;

use format::OutputFormat;

/// Exit code for usage errors (clap uses the same one).
const EXIT_USAGE: u8 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "gasoline",
    version,
    about = "Local daemon bridging AI coding assistants and a live browser",
    after_help = "Tool invocation: gasoline <tool> <action> [--key value ...]\n\
                  Tools: observe, generate, configure, interact"
)]
struct Cli {
    /// Run the daemon in the foreground.
    #[arg(long)]
    server: bool,
    /// Run the daemon (detached spawn target).
    #[arg(long)]
    daemon: bool,
    /// Stop a running daemon.
    #[arg(long)]
    stop: bool,
    /// With --stop: SIGTERM the daemon if graceful shutdown stalls.
    #[arg(long)]
    force: bool,
    /// Run the setup check battery.
    #[arg(long)]
    check: bool,
    /// Run the doctor battery against the running daemon.
    #[arg(long)]
    doctor: bool,
    /// Serve MCP over stdio (connect mode).
    #[arg(long)]
    connect: bool,
    /// Run alongside an existing daemon (requires an isolated --state-dir).
    #[arg(long)]
    parallel: bool,
    #[arg(long, env = "GASOLINE_PORT", default_value_t = 7890)]
    port: u16,
    #[arg(long, env = "GASOLINE_STATE_DIR")]
    state_dir: Option<PathBuf>,
    #[arg(long, env = "GASOLINE_FORMAT", value_enum, default_value_t = OutputFormat::Human)]
    format: OutputFormat,
    /// Tool-call timeout in milliseconds.
    #[arg(long)]
    timeout: Option<u64>,
    /// Fast-path: minimum samples before the failure-ratio verdict counts.
    #[arg(long)]
    fastpath_min_samples: Option<u64>,
    /// Fast-path: maximum acceptable failure ratio.
    #[arg(long)]
    fastpath_max_failure_ratio: Option<f64>,
    /// `<tool> <action> [--key value ...]`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    invocation: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    if cli.server || cli.daemon {
        lifecycle::run(LaunchOptions {
            port: cli.port,
            state_dir: cli.state_dir.clone(),
            parallel: cli.parallel,
        })
        .await?;
        return Ok(ExitCode::SUCCESS);
    }

    if cli.connect {
        return run_connect(&cli).await;
    }

    if cli.stop {
        let stopped = bridge::stop_daemon(cli.port, cli.state_dir.clone(), cli.force).await?;
        if stopped {
            println!("daemon on port {} stopped", cli.port);
            return Ok(ExitCode::SUCCESS);
        }
        println!("no daemon running on port {}", cli.port);
        return Ok(ExitCode::FAILURE);
    }

    if cli.check || cli.doctor {
        return run_check(&cli).await;
    }

    if !cli.invocation.is_empty() {
        return run_tool(&cli).await;
    }

    eprintln!("nothing to do; see --help");
    Ok(ExitCode::from(EXIT_USAGE))
}

/// Connect mode: MCP over stdio, with the HTTP surface bound for the
/// extension when the port is free.
async fn run_connect(cli: &Cli) -> anyhow::Result<ExitCode> {
    let state_dir = lifecycle::resolve_state_dir(cli.state_dir.clone());
    std::fs::create_dir_all(&state_dir)?;
    let state = ServerState::new(state_dir, cli.port);
    lifecycle::spawn_background_tasks(&state);

    match tokio::net::TcpListener::bind(("127.0.0.1", cli.port)).await {
        Ok(listener) => {
            let app = gasoline_server::http::router(Arc::clone(&state));
            let shutdown = state.shutdown.clone();
            tokio::spawn(async move {
                let serve = axum_serve(listener, app, shutdown).await;
                if let Err(err) = serve {
                    tracing::warn!("http surface stopped: {err}");
                }
            });
        }
        Err(err) => {
            // A daemon already owns the port; stdio still works.
            tracing::warn!(port = cli.port, "not binding http surface: {err}");
        }
    }

    gasoline_server::stdio::run_connect(state).await?;
    Ok(ExitCode::SUCCESS)
}

async fn axum_serve(
    listener: tokio::net::TcpListener,
    app: axum::Router,
    shutdown: tokio_util::sync::CancellationToken,
) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

/// `--check` / `--doctor`: the daemon battery plus the optional fast-path
/// JSONL threshold evaluation.
async fn run_check(cli: &Cli) -> anyhow::Result<ExitCode> {
    let mut failed = false;

    match bridge::fetch_doctor(cli.port).await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.get("status").and_then(serde_json::Value::as_str) == Some("unhealthy") {
                failed = true;
            }
        }
        Err(err) => {
            println!("daemon not reachable on port {}: {err}", cli.port);
            failed = true;
        }
    }

    if let (Some(min_samples), Some(max_ratio)) =
        (cli.fastpath_min_samples, cli.fastpath_max_failure_ratio)
    {
        let state_dir = lifecycle::resolve_state_dir(cli.state_dir.clone());
        let log_path = state_dir.join("telemetry.jsonl");
        match gasoline_server::doctor::scan_jsonl(&log_path) {
            Ok(stats) => {
                let verdict =
                    gasoline_server::doctor::evaluate_threshold(&stats, min_samples, max_ratio);
                println!("{}", serde_json::to_string_pretty(&verdict)?);
                if matches!(
                    verdict,
                    gasoline_server::doctor::FastpathVerdict::Fail { .. }
                ) {
                    failed = true;
                }
            }
            Err(err) => {
                println!("fastpath log not readable at {}: {err}", log_path.display());
            }
        }
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// The tool self-bridge: `gasoline <tool> <action> [--key value ...]`.
async fn run_tool(cli: &Cli) -> anyhow::Result<ExitCode> {
    let parsed = match invocation::parse(&cli.invocation) {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("usage error: {message}");
            return Ok(ExitCode::from(EXIT_USAGE));
        }
    };
    let port = parsed.port.unwrap_or(cli.port);
    let format = parsed.format.unwrap_or(cli.format);
    let timeout_ms = parsed.timeout_ms.or(cli.timeout);

    bridge::ensure_daemon(port, cli.state_dir.clone()).await?;
    let result =
        bridge::call_tool(port, &parsed.tool, parsed.arguments.clone(), timeout_ms).await?;

    println!("{}", format::render(&result, format));
    Ok(if result.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
