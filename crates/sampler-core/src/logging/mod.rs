//! Structured logging for the sampler.
//!
//! Two output modes:
//! - Human-readable `fmt` output for bench use
//! - JSONL for the deployed service, one record per line
//!
//! Both write to stderr or to `LOG_DIRECTORY/LOG_FILE_ADC`.
//!
//! # Usage
//!
//! ```ignore
//! use sampler_core::logging::{init_logging, LogConfig};
//!
//! let config = LogConfig::from_env();
//! init_logging(&config)?;
//! tracing::info!(batch_id = 7, "batch published");
//! ```

pub mod config;
pub mod layer;

pub use config::{LogConfig, LogDestination, LogFormat, LogLevel};
pub use layer::JsonlLayer;

use std::fs::{self, OpenOptions};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Errors from logging initialization.
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("cannot open log file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("logging already initialized: {0}")]
    AlreadyInitialized(String),
}

fn open_log_file(path: &Path) -> Result<fs::File, LoggingError> {
    let to_err = |source| LoggingError::File {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(to_err)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_err)
}

/// Initialize the logging subsystem.
///
/// Must be called once at startup before any logging occurs.
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    let result = match config.format {
        LogFormat::Human => {
            let (writer, use_ansi) = match &config.destination {
                LogDestination::Stderr => (
                    BoxMakeWriter::new(io::stderr),
                    io::stderr().is_terminal(),
                ),
                LogDestination::File(path) => {
                    (BoxMakeWriter::new(Mutex::new(open_log_file(path)?)), false)
                }
            };
            let fmt_layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_thread_names(true)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
            }
        }
        LogFormat::Jsonl => {
            let writer: Box<dyn Write + Send> = match &config.destination {
                LogDestination::Stderr => Box::new(io::stderr()),
                LogDestination::File(path) => Box::new(open_log_file(path)?),
            };
            tracing_subscriber::registry()
                .with(filter)
                .with(JsonlLayer::new(writer, config.logger.clone()))
                .try_init()
        }
    };

    result.map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_config_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.format, LogFormat::Human);
        assert_eq!(config.level, LogLevel::Info);
    }

    #[test]
    fn test_open_log_file_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logs").join("adc.log");
        let mut file = open_log_file(&path).unwrap();
        writeln!(file, "line").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_open_log_file_under_a_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();
        let err = open_log_file(&blocker.join("adc.log")).unwrap_err();
        assert!(matches!(err, LoggingError::File { .. }));
    }
}
