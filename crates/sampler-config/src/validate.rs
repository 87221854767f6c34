//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::resolve::SamplerConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Parse error for {field}: {message}")]
    ParseError { field: String, message: String },

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Missing required variable: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::ParseError { .. } => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::MissingField(_) => 64,
            ValidationError::InvalidValue { .. } => 65,
        }
    }

    /// The environment variable the error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::ParseError { field, .. } | ValidationError::InvalidValue { field, .. } => {
                Some(field)
            }
            ValidationError::MissingField(field) => Some(field),
            ValidationError::SemanticError(_) => None,
        }
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate a resolved configuration semantically.
pub fn validate_config(config: &SamplerConfig) -> ValidationResult<()> {
    if config.batch.size == 0 {
        return Err(invalid("BATCH_SIZE", "must be a positive integer"));
    }

    validate_prefix(&config.batch.prefix)?;

    if config.batch.output_dir.as_os_str().is_empty() {
        return Err(invalid("FILE_DIRECTORY_ADC_BATCHES", "must not be empty"));
    }
    if config.batch.backup_dir.as_os_str().is_empty() {
        return Err(invalid("FILE_DIRECTORY_ADC_BATCHES_BACKUP", "must not be empty"));
    }

    if config.sampling.period.is_zero() {
        return Err(invalid("SAMPLING_RATE", "must be greater than zero seconds"));
    }
    if config.sampling.smoothing_window == 0 {
        return Err(invalid("SMOOTHING_WINDOW", "must be a positive integer"));
    }

    if config.sensor.channel > 3 {
        return Err(invalid(
            "ADC_CHANNEL",
            format!("must be in 0..=3, got {}", config.sensor.channel),
        ));
    }
    if config.sensor.read_timeout.is_zero() {
        return Err(invalid("SENSOR_READ_TIMEOUT_MS", "must be greater than zero"));
    }

    if !(config.calibration.resistor_ohms.is_finite() && config.calibration.resistor_ohms > 0.0) {
        return Err(invalid(
            "RESISTOR_VALUE",
            format!("must be a positive number of ohms, got {}", config.calibration.resistor_ohms),
        ));
    }
    if !config.calibration.gain.is_finite() || config.calibration.gain == 0.0 {
        return Err(invalid("CALIBRATION_GAIN", "must be a finite, non-zero number"));
    }
    if !config.calibration.offset.is_finite() {
        return Err(invalid("CALIBRATION_OFFSET", "must be a finite number"));
    }

    if config.display.refresh.is_zero() {
        return Err(invalid("DISPLAY_REFRESH_SECS", "must be greater than zero"));
    }

    if config.queue.host.trim().is_empty() {
        return Err(invalid("QUEUE_HOST", "must not be empty"));
    }
    if config.queue.port == 0 {
        return Err(invalid("QUEUE_PORT", "must be in 1..=65535"));
    }
    if config.queue.event_type.trim().is_empty() {
        return Err(invalid("ADC_BATCH_CREATED_EVENT", "must not be empty"));
    }

    if config.queue.auth_key.is_empty() {
        return Err(ValidationError::SemanticError(
            "AUTH_KEY is empty; the queue server rejects unauthenticated clients".to_string(),
        ));
    }

    Ok(())
}

/// The prefix becomes part of a file name and of the recovery pattern.
fn validate_prefix(prefix: &str) -> ValidationResult<()> {
    if prefix.is_empty() {
        return Err(invalid("BATCH_FILE_PREFIX", "must not be empty"));
    }
    if prefix.contains('/') || prefix.contains('\\') || prefix.contains('\0') {
        return Err(invalid(
            "BATCH_FILE_PREFIX",
            "must not contain path separators",
        ));
    }
    Ok(())
}
