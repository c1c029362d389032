//! Logging configuration and initialization.
//!
//! Standard output carries the live display, so log lines go to standard
//! error, or to a file with `--log-file`.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: '{}'. Use 'text' or 'json'.", s)),
        }
    }
}

/// Logging preset levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Startup and outcome only
    #[default]
    Production,
    /// Tier and directory transitions
    Verbose,
    /// Session and model detail
    Debug,
    /// Every classified line
    Trace,
    /// Warnings and errors only
    Quiet,
}

/// Logging configuration built from CLI arguments.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub preset: LogPreset,
    /// Per-target level overrides (e.g., "buildwatch::model" -> DEBUG)
    pub overrides: HashMap<String, Level>,
    pub format: LogFormat,
    /// Write logs here instead of standard error.
    pub file: Option<PathBuf>,
}

impl LogConfig {
    /// Create a new LogConfig from CLI arguments.
    pub fn from_cli(
        verbose: bool,
        debug: bool,
        trace: bool,
        quiet: bool,
        log_overrides: Vec<String>,
        format: LogFormat,
    ) -> Self {
        let preset = if quiet {
            LogPreset::Quiet
        } else if trace {
            LogPreset::Trace
        } else if debug {
            LogPreset::Debug
        } else if verbose {
            LogPreset::Verbose
        } else {
            LogPreset::Production
        };

        // "target=level", comma separated, targets auto-prefixed
        let mut overrides = HashMap::new();
        for override_str in log_overrides {
            for part in override_str.split(',') {
                if let Some((target, level_str)) = part.split_once('=') {
                    let target = target.trim();
                    let full_target = if target == "buildwatch" || target.starts_with("buildwatch::") {
                        target.to_string()
                    } else {
                        format!("buildwatch::{}", target)
                    };

                    if let Ok(level) = parse_level(level_str.trim()) {
                        overrides.insert(full_target, level);
                    }
                }
            }
        }

        Self {
            preset,
            overrides,
            format,
            file: None,
        }
    }

    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }

    /// Build an EnvFilter from this configuration. `RUST_LOG` wins.
    pub fn build_filter(&self) -> EnvFilter {
        if let Ok(env_filter) = EnvFilter::try_from_default_env() {
            return env_filter;
        }
        EnvFilter::try_new(self.directives()).unwrap_or_else(|_| EnvFilter::new("warn"))
    }

    fn directives(&self) -> String {
        let mut directives: Vec<String> = match self.preset {
            LogPreset::Production => vec![
                "buildwatch::startup=info".into(),
                "buildwatch::session=info".into(),
                "buildwatch::model=warn".into(),
                "buildwatch::render=warn".into(),
                "buildwatch::classifier=off".into(),
            ],
            LogPreset::Verbose => vec![
                "buildwatch=info".into(),
                "buildwatch::model=debug".into(),
                "buildwatch::classifier=off".into(),
            ],
            LogPreset::Debug => vec![
                "buildwatch=debug".into(),
                "buildwatch::classifier=off".into(),
            ],
            LogPreset::Trace => vec!["buildwatch=trace".into()],
            LogPreset::Quiet => vec!["buildwatch=warn".into()],
        };

        for (target, level) in &self.overrides {
            directives.push(format!("{}={}", target, level_to_str(*level)));
        }
        directives.join(",")
    }
}

fn parse_level(s: &str) -> Result<Level, ()> {
    match s.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(()),
    }
}

fn level_to_str(level: Level) -> &'static str {
    match level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    }
}

/// Initialize the tracing subscriber with the given configuration.
pub fn init(config: &LogConfig) -> Result<()> {
    let filter = config.build_filter();

    let file = match &config.file {
        Some(path) => Some(Mutex::new(
            File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?,
        )),
        None => None,
    };

    match (config.format, file) {
        (LogFormat::Text, None) => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .init(),
        (LogFormat::Text, Some(file)) => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .init(),
        (LogFormat::Json, None) => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init(),
        (LogFormat::Json, Some(file)) => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init(),
    }
    Ok(())
}
