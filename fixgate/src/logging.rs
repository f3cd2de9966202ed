//! Logging infrastructure for fixgate.
//!
//! Provides structured logging with console output and optional file output:
//! - Prints to stdout, with ANSI colors
//! - Optionally writes to `<directory>/<file>` (cleared on session start)
//! - Level from the `[logging]` config section, overridable via RUST_LOG

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default log level when neither RUST_LOG nor the config sets one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "fixgate.log";

/// `[logging]` section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error.
    pub level: String,

    /// Directory for the log file. `None` logs to stdout only.
    pub directory: Option<PathBuf>,

    /// Log file name inside `directory`.
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            directory: None,
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

impl LoggingConfig {
    /// Full path of the log file, if file logging is enabled.
    pub fn log_path(&self) -> Option<PathBuf> {
        self.directory.as_ref().map(|dir| dir.join(&self.file))
    }
}

/// Errors from [`init_logging`].
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to prepare log file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("A global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the global subscriber.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created, the log file
/// cannot be cleared, or a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true)
        .with_target(false);

    let (file_layer, file_guard) = match (&config.directory, config.log_path()) {
        (Some(dir), Some(path)) => {
            prepare_log_file(dir, &path)?;
            let appender = tracing_appender::rolling::never(dir, &config.file);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Create the log directory and truncate the previous session's file.
fn prepare_log_file(dir: &Path, path: &Path) -> Result<(), LoggingError> {
    fs::create_dir_all(dir).map_err(|source| LoggingError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    fs::write(path, "").map_err(|source| LoggingError::Io {
        path: path.to_path_buf(),
        source,
    })
}
