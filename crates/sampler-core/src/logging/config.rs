//! Logging configuration.
//!
//! Read from the environment:
//! - `LOG_LEVEL`, `LOG_FORMAT`
//! - `LOG_DIRECTORY` + `LOG_FILE_ADC` for a file destination
//! - `LOGGER_ADC` for the logger name stamped on JSONL records
//!
//! `RUST_LOG`, when set, overrides the level filter entirely.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";
pub const LOG_FORMAT_VAR: &str = "LOG_FORMAT";
pub const LOG_DIRECTORY_VAR: &str = "LOG_DIRECTORY";
pub const LOG_FILE_VAR: &str = "LOG_FILE_ADC";
pub const LOGGER_NAME_VAR: &str = "LOGGER_ADC";

/// Logger name used when `LOGGER_ADC` is unset.
pub const DEFAULT_LOGGER_NAME: &str = "adc";

/// File name used when only `LOG_DIRECTORY` is set.
pub const DEFAULT_LOG_FILE: &str = "adc.log";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console format (default).
    #[default]
    Human,
    /// Machine-parseable JSON lines.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "console" | "pretty" => Ok(LogFormat::Human),
            "jsonl" | "json" | "structured" => Ok(LogFormat::Jsonl),
            _ => Err(format!("unknown log format: {}", s)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Human => write!(f, "human"),
            LogFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// Log level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" | "critical" => Ok(LogLevel::Error),
            "off" | "none" | "quiet" => Ok(LogLevel::Off),
            _ => Err(format!("unknown log level: {}", s)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Off => write!(f, "off"),
        }
    }
}

impl From<LogLevel> for tracing_subscriber::filter::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing_subscriber::filter::LevelFilter::TRACE,
            LogLevel::Debug => tracing_subscriber::filter::LevelFilter::DEBUG,
            LogLevel::Info => tracing_subscriber::filter::LevelFilter::INFO,
            LogLevel::Warn => tracing_subscriber::filter::LevelFilter::WARN,
            LogLevel::Error => tracing_subscriber::filter::LevelFilter::ERROR,
            LogLevel::Off => tracing_subscriber::filter::LevelFilter::OFF,
        }
    }
}

/// Where log records go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    Stderr,
    /// Append to a file; its parent directory is created on init.
    File(PathBuf),
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    pub destination: LogDestination,
    /// Logger name stamped on every JSONL record.
    pub logger: String,
    /// Whether to include timestamps in human output.
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Info,
            destination: LogDestination::Stderr,
            logger: DEFAULT_LOGGER_NAME.to_string(),
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Create config from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from a variable lookup. Unparseable values fall back to
    /// defaults; logging must come up even when the rest of the
    /// configuration is broken, so that the breakage can be reported.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = LogConfig::default();

        if let Some(level) = get(LOG_LEVEL_VAR).and_then(|v| v.trim().parse().ok()) {
            config.level = level;
        }
        if let Some(format) = get(LOG_FORMAT_VAR).and_then(|v| v.trim().parse().ok()) {
            config.format = format;
        }
        if let Some(name) = get(LOGGER_NAME_VAR) {
            config.logger = name.trim().to_string();
        }

        config.destination = match (get(LOG_DIRECTORY_VAR), get(LOG_FILE_VAR)) {
            (Some(dir), Some(file)) => LogDestination::File(PathBuf::from(dir).join(file)),
            (Some(dir), None) => LogDestination::File(PathBuf::from(dir).join(DEFAULT_LOG_FILE)),
            (None, Some(file)) => LogDestination::File(PathBuf::from(file)),
            (None, None) => LogDestination::Stderr,
        };

        config
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_destination(mut self, destination: LogDestination) -> Self {
        self.destination = destination;
        self
    }
}
