//! # Observability
//!
//! Centralized logging setup for the ledger-sync binaries.
//!
//! Services call [`init_with_config`] once at startup and then use the
//! standard `tracing` macros. They do not know where logs go:
//!
//! - `json` format: one JSON object per line, on stdout or appended to a
//!   file, with secret-looking fields redacted and span fields (such as a
//!   run id) merged into every event.
//! - `pretty` format: compact human-readable lines on stderr.
//!
//! `RUST_LOG` always wins over the configured default level.
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "ledger-sync".into(),
//!     default_level: "debug".into(),
//!     ..Default::default()
//! });
//! tracing::info!(entity = "invoices", "sync started");
//! ```

mod json_layer;
mod writer;

use std::io;
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use json_layer::{redact_fields, JsonLayer, LogEntry, REDACTED};
pub use writer::{AppendLogWriter, WriterFactory};

/// Output format of the primary log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSONL, one entry per line.
    #[default]
    Json,
    /// Compact human-readable lines on stderr.
    Pretty,
}

impl LogFormat {
    /// Parse a format name. Anything that is not a known human format is JSON.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" | "compact" => Self::Pretty,
            _ => Self::Json,
        }
    }
}

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, written into every JSON line.
    pub service_name: String,

    /// Default level filter (e.g. "debug", "info").
    /// Overridden by `RUST_LOG` when set.
    pub default_level: String,

    /// Append JSON lines to this file instead of stdout.
    pub log_path: Option<PathBuf>,

    /// Also emit compact lines on stderr (JSON format only).
    pub also_stderr: bool,

    /// Primary output format.
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
            format: LogFormat::Json,
        }
    }
}

/// Initialize logging with default settings for the given service.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with custom configuration.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init_with_config(config: LogConfig) {
    let env_filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_level))
    };

    if config.format == LogFormat::Pretty {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_target(true)
            .with_writer(io::stderr)
            .compact()
            .init();
        return;
    }

    let make_writer = match &config.log_path {
        Some(path) => match AppendLogWriter::open(path) {
            Ok(writer) => BoxMakeWriter::new(WriterFactory::new(writer)),
            Err(err) => {
                eprintln!(
                    "failed to open log file {}: {err}; logging to stdout",
                    path.display()
                );
                BoxMakeWriter::new(io::stdout)
            }
        },
        None => BoxMakeWriter::new(io::stdout),
    };

    let json_layer = JsonLayer::new(config.service_name.clone(), make_writer);

    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(io::stderr)
            .compact()
    });

    tracing_subscriber::registry()
        .with(json_layer.with_filter(env_filter()))
        .with(stderr_layer.map(|layer| layer.with_filter(env_filter())))
        .init();

    if let Some(path) = &config.log_path {
        tracing::debug!(log_path = %path.display(), "observability initialized");
    }
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};
