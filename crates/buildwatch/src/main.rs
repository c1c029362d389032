//! buildwatch - pipe a tiered make build through this for a live progress display.

use anyhow::{Context, Result};
use buildwatch::{config, logging};
use buildwatch_core::AnsiTerminal;
use clap::Parser;
use std::io;
use std::path::PathBuf;

use config::Config;
use logging::{LogConfig, LogFormat};

/// Live progress display for tiered recursive make builds.
#[derive(Parser, Debug)]
#[command(name = "buildwatch")]
#[command(about = "Reads a build log on stdin and draws live per-directory progress")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging (tier and directory transitions)
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging, including every classified line
    #[arg(long)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "model=debug" or "classifier=trace").
    /// Can be specified multiple times. Targets are prefixed with "buildwatch::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Write logs to a file instead of stderr
    #[arg(long = "log-file", value_name = "FILE")]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    #[cfg(unix)]
    reset_sigpipe();

    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    )
    .with_file(cli.log_file);
    logging::init(&log_config)?;

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    tracing::info!(
        target: "buildwatch::startup",
        recent_lines = config.recent_lines,
        set_title = config.set_title,
        "configuration loaded"
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    let summary = buildwatch_core::watch(
        stdin.lock(),
        AnsiTerminal::new(stdout.lock()),
        config.to_session_options(),
    )
    .context("build display failed")?;

    tracing::info!(
        target: "buildwatch::startup",
        outcome = %summary.outcome,
        errors = summary.errors,
        "exiting"
    );
    Ok(())
}

#[cfg(unix)]
fn reset_sigpipe() {
    // a closed pipe ends the process quietly
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}
