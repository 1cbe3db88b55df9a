//! CLI entry point for ktail.
//!
//! Prints the last lines of a file and, with `--follow`, keeps streaming
//! whatever is appended to it until interrupted.
//!
//! # Usage
//!
//! ```bash
//! ktail [OPTIONS] <FILE>
//!
//! # Last 1000 lines
//! ktail /var/log/syslog
//!
//! # Last 20 lines, then follow
//! ktail -n 20 -f /var/log/syslog
//!
//! # Debug diagnostics on stderr
//! RUST_LOG=kt_session=trace ktail -f app.log
//! ```
//!
//! Standard output carries only file content. Diagnostics, including the
//! overlong-line warning, go to standard error.

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::future::Future;
use std::io::{BufWriter, Write};
use std::num::NonZeroUsize;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use color_eyre::eyre::WrapErr;
use kt_core::config::parse_line_count;
use kt_core::{DEFAULT_LINES, ShutdownFlag, TailConfig};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Print the last lines of a file, optionally following appended content.
#[derive(Parser, Debug)]
#[command(name = "ktail", version, about, long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    /// File to read.
    file: Utf8PathBuf,

    /// Number of trailing lines to print.
    #[arg(
        short = 'n',
        long,
        value_name = "LINES",
        default_value_t = DEFAULT_LINES,
        value_parser = parse_line_count
    )]
    number: NonZeroUsize,

    /// Keep printing data as it is appended to the file.
    #[arg(short, long)]
    follow: bool,

    /// Enable verbose logging (debug level).
    #[arg(long)]
    verbose: bool,

    /// Disable colored diagnostics.
    #[arg(long)]
    no_color: bool,

    /// Print version.
    #[arg(short = 'v', long, action = ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for diagnostics on stderr.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `warn` level by default so that
/// only problems such as overlong lines are reported.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "warn" };
        EnvFilter::new(format!("{level},mio=warn,notify=warn"))
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi),
        )
        .with(filter)
        .init();
}

/// Builds a [`TailConfig`] from CLI arguments.
fn build_config(cli: &Cli) -> TailConfig {
    TailConfig::new(cli.file.clone())
        .with_lines(cli.number)
        .with_follow(cli.follow)
}

// =============================================================================
// SIGNAL HANDLING
// =============================================================================

/// Registers the interrupt and terminate handlers.
///
/// Registration happens before the returned future is first polled, so a
/// signal that arrives while the window is still being printed is not lost.
#[cfg(unix)]
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => debug!("received SIGINT"),
            _ = terminate.recv() => debug!("received SIGTERM"),
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()>> {
    Ok(async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    })
}

/// Raises `shutdown` once `signal` completes.
async fn forward_shutdown<F>(signal: F, shutdown: ShutdownFlag)
where
    F: Future<Output = ()>,
{
    signal.await;
    info!("stop requested, shutting down");
    shutdown.request();
}

// =============================================================================
// COMMAND IMPLEMENTATION
// =============================================================================

/// Installs the stop handlers for follow mode.
///
/// A bounded scan keeps the default dispositions so that an interrupt ends
/// the process straight away.
fn install_stop_handlers(
    config: &TailConfig,
    shutdown: &ShutdownFlag,
) -> Option<JoinHandle<()>> {
    if !config.follow {
        return None;
    }

    match shutdown_signal() {
        Ok(signal) => Some(tokio::spawn(forward_shutdown(signal, shutdown.clone()))),
        Err(error) => {
            warn!(%error, "cannot install signal handlers");
            None
        }
    }
}

/// Validates the configuration, then runs the session on a blocking thread
/// while signals are forwarded to its stop flag.
///
/// # Errors
///
/// Returns an error if validation fails, the file cannot be read or
/// reopened, the change watcher breaks, or stdout goes away.
async fn run(cli: &Cli) -> color_eyre::Result<()> {
    let config = build_config(cli);
    let path = config.path().to_owned();
    config
        .validate()
        .wrap_err_with(|| format!("cannot tail {path}"))?;

    let shutdown = ShutdownFlag::new();
    let signals = install_stop_handlers(&config, &shutdown);

    let session = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let out = BufWriter::new(stdout.lock());
        kt_session::run(config, shutdown, out)
    });

    let result = session.await;
    if let Some(signals) = signals {
        signals.abort();
    }

    let summary = result
        .wrap_err("session task failed")?
        .wrap_err_with(|| format!("cannot tail {path}"))?;

    debug!(
        path = %summary.path,
        lines = summary.lines_seen,
        bytes = summary.bytes_consumed,
        truncated = summary.truncated_lines,
        changes = summary.changes,
        "session finished"
    );
    Ok(())
}

/// Reports a clap outcome and picks the exit status.
///
/// Help and version requests go to stdout and succeed. Usage errors go to
/// stderr and exit 1.
fn usage_exit(err: &clap::Error) -> ExitCode {
    let _ = err.print();
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

/// Writes a failure report to stderr.
fn failure_exit(report: &color_eyre::Report) -> ExitCode {
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    let _ = writeln!(handle, "Error: {report:?}");
    ExitCode::FAILURE
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> ExitCode {
    // 1. Install color-eyre FIRST (before any potential panics)
    if let Err(report) = color_eyre::install() {
        return failure_exit(&report);
    }

    // 2. Parse CLI arguments
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return usage_exit(&err),
    };

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Run
    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => failure_exit(&report),
    }
}
