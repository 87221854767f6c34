//! Error types for the ADC sampler.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints separating fatal startup errors from per-cycle faults
//! - Remediation suggestions for operators
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Sensor Unavailable
//!   Reason: sensor unavailable: /sys/bus/iio/devices/iio:device0 not found
//!   Fix: Check that the ADC is wired and the ads1015 kernel driver is bound.
//! ```
//!
//! # Log-Facing Output
//!
//! Errors serialize to structured JSON:
//! ```json
//! {
//!   "code": 20,
//!   "category": "sensor",
//!   "message": "sensor unavailable: ...",
//!   "recoverable": false,
//!   "context": { "batch_id": 12 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for sampler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Environment configuration errors.
    Config,
    /// ADC / bus acquisition errors.
    Sensor,
    /// Character display errors.
    Display,
    /// Batch file storage errors.
    Storage,
    /// Downstream queue errors.
    Queue,
    /// Generic I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Sensor => write!(f, "sensor"),
            ErrorCategory::Display => write!(f, "display"),
            ErrorCategory::Storage => write!(f, "storage"),
            ErrorCategory::Queue => write!(f, "queue"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for the sampler.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing configuration variable: {0}")]
    MissingVariable(String),

    // Sensor errors (20-29)
    #[error("sensor unavailable: {0}")]
    SensorUnavailable(String),

    #[error("sensor read failed: {0}")]
    SensorRead(String),

    #[error("sensor read timed out after {millis}ms")]
    SensorTimeout { millis: u64 },

    // Display errors (30-39)
    #[error("display unavailable: {0}")]
    DisplayUnavailable(String),

    // Storage errors (40-49)
    #[error("batch storage failed: {0}")]
    Storage(String),

    #[error("batch id recovery failed: {0}")]
    Recovery(String),

    // Queue errors (50-59)
    #[error("queue unavailable: {0}")]
    QueueUnavailable(String),

    #[error("event publish failed: {0}")]
    Publish(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Sensor errors
    /// - 30-39: Display errors
    /// - 40-49: Storage errors
    /// - 50-59: Queue errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::MissingVariable(_) => 11,
            Error::SensorUnavailable(_) => 20,
            Error::SensorRead(_) => 21,
            Error::SensorTimeout { .. } => 22,
            Error::DisplayUnavailable(_) => 30,
            Error::Storage(_) => 40,
            Error::Recovery(_) => 41,
            Error::QueueUnavailable(_) => 50,
            Error::Publish(_) => 51,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::MissingVariable(_) => ErrorCategory::Config,
            Error::SensorUnavailable(_) | Error::SensorRead(_) | Error::SensorTimeout { .. } => {
                ErrorCategory::Sensor
            }
            Error::DisplayUnavailable(_) => ErrorCategory::Display,
            Error::Storage(_) | Error::Recovery(_) => ErrorCategory::Storage,
            Error::QueueUnavailable(_) | Error::Publish(_) => ErrorCategory::Queue,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether the sampling loop may retry after this error.
    ///
    /// Non-recoverable errors are the startup class: without the hardware
    /// path, the queue, or a valid configuration the process cannot make
    /// progress and terminates. Everything that can happen inside a single
    /// collection cycle is recoverable and retried with the same batch id.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => false,
            Error::MissingVariable(_) => false,

            Error::SensorUnavailable(_) => false,
            Error::SensorRead(_) => true,
            Error::SensorTimeout { .. } => true,

            Error::DisplayUnavailable(_) => false,

            Error::Storage(_) => true,
            Error::Recovery(_) => false,

            Error::QueueUnavailable(_) => false,
            Error::Publish(_) => true,

            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => "Check the environment values passed to the sampler service.",
            Error::MissingVariable(_) => "Set the variable in the sampler service environment.",
            Error::SensorUnavailable(_) => {
                "Check that the ADC is wired and the ads1015 kernel driver is bound."
            }
            Error::SensorRead(_) => "Transient bus error. The cycle is retried automatically.",
            Error::SensorTimeout { .. } => {
                "The ADC did not answer in time. Check bus load and SENSOR_READ_TIMEOUT_MS."
            }
            Error::DisplayUnavailable(_) => {
                "Check DISPLAY_FRAME_PATH permissions or set DISPLAY_KIND=none."
            }
            Error::Storage(_) => "Check disk space and permissions on the output directory.",
            Error::Recovery(_) => "Check that the backup directory is readable.",
            Error::QueueUnavailable(_) => {
                "Check QUEUE_HOST/QUEUE_PORT and that the queue server is running."
            }
            Error::Publish(_) => "The queue dropped the event. The cycle is retried automatically.",
            Error::Io(_) => "Check disk space and permissions. Retry the operation.",
            Error::Json(_) => "Serialization failed. Report this as a bug.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::MissingVariable(_) => "Missing Configuration",
            Error::SensorUnavailable(_) => "Sensor Unavailable",
            Error::SensorRead(_) => "Sensor Read Failed",
            Error::SensorTimeout { .. } => "Sensor Timeout",
            Error::DisplayUnavailable(_) => "Display Unavailable",
            Error::Storage(_) => "Batch Storage Failed",
            Error::Recovery(_) => "Batch Id Recovery Failed",
            Error::QueueUnavailable(_) => "Queue Unavailable",
            Error::Publish(_) => "Event Publish Failed",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Error",
        }
    }
}

/// Structured error record for JSONL logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is retried by the sampling loop.
    pub recoverable: bool,

    /// Additional structured context (e.g., batch id, path).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        if let Error::SensorTimeout { millis } = err {
            context.insert("timeout_ms".to_string(), serde_json::json!(millis));
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
