use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Configuration for the logging system
pub struct LogConfig {
    /// Directory where log files will be stored
    pub log_dir: PathBuf,
    /// Prefix for log file names
    pub file_prefix: String,
    /// Maximum number of log files to keep (rotation)
    pub max_files: usize,
    /// Whether to write logs to file
    pub log_to_file: bool,
    /// Log level filter string
    pub log_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        let log_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".streetview-uploader")
            .join("logs");

        Self {
            log_dir,
            file_prefix: "streetview-uploader".to_string(),
            max_files: 5,
            log_to_file: false,
            log_level: "info".to_string(),
        }
    }
}

/// Initialize the logging system with stderr output and, optionally, a
/// rotating log file.
///
/// # Log Targets
/// - `uploader` - strategy selection and metadata creation
/// - `uploader::session` - resumable session state machine
/// - `uploader::raw` - single-shot photo uploads
/// - `places` - place lookup
/// - `main` - application lifecycle
///
/// # Example
/// ```bash
/// # Set log level for all components
/// RUST_LOG=debug streetview-uploader --video=...
///
/// # Set different levels for different components
/// RUST_LOG=uploader::session=debug,places=info streetview-uploader ...
/// ```
pub fn init_logging(config: LogConfig) -> Result<LogGuard> {
    // Configure environment filter with defaults
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // The subscriber is assembled in two branches because
    // tracing-subscriber's layer types differ with and without the file
    // layer.
    let worker_guard = if config.log_to_file {
        std::fs::create_dir_all(&config.log_dir).context("Failed to create log directory")?;

        // Create file appender with rotation
        let file_appender = tracing_appender::rolling::RollingFileAppender::builder()
            .rotation(tracing_appender::rolling::Rotation::DAILY)
            .filename_prefix(&config.file_prefix)
            .filename_suffix("log")
            .max_log_files(config.max_files)
            .build(&config.log_dir)
            .context("Failed to create file appender")?;

        // Create non-blocking writer for file output
        let (non_blocking_file, worker_guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = fmt::layer()
            .compact()
            .with_writer(non_blocking_file)
            .with_target(true)
            .with_ansi(false)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

        let stderr_layer = fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(stderr_layer)
            .init();

        worker_guard
    } else {
        // Create a dummy non-blocking writer that we won't use, just for the guard
        let (non_blocking_sink, worker_guard) = tracing_appender::non_blocking(std::io::sink());
        drop(non_blocking_sink);

        let stderr_layer = fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();

        worker_guard
    };

    tracing::debug!(
        target: "main",
        log_to_file = config.log_to_file,
        log_level = %config.log_level,
        "Logging system initialized"
    );

    Ok(LogGuard {
        _worker_guard: worker_guard,
    })
}

/// Guard that ensures logs are flushed before exit
/// This wraps the WorkerGuard from tracing_appender which MUST be kept alive
/// for the entire application lifetime to ensure file logging works properly
pub struct LogGuard {
    _worker_guard: tracing_appender::non_blocking::WorkerGuard,
}
