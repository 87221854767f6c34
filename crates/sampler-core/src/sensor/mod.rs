//! Sensor port and adapters.
//!
//! The sampling loop only needs "read one scaled reading in volts". Adapters:
//! - [`IioAdcSensor`]: ADS1115 through the Linux IIO `ads1015` driver
//! - [`SimulatedSensor`]: noisy constant source for bench runs
//! - [`TimedSensor`]: wraps any adapter and bounds each read with a timeout

pub mod iio;
pub mod simulated;
pub mod timed;

pub use iio::IioAdcSensor;
pub use simulated::SimulatedSensor;
pub use timed::TimedSensor;

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors from sensor adapters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    #[error("sensor unavailable at {device}: {reason}")]
    Unavailable { device: PathBuf, reason: String },

    #[error("sensor read failed: {0}")]
    Read(String),

    #[error("sensor returned unparseable value {0:?}")]
    Parse(String),

    #[error("sensor read timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    #[error("sensor worker stopped")]
    Disconnected,
}

impl SensorError {
    /// Startup-class errors; everything else is a per-read fault.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SensorError::Unavailable { .. })
    }
}

impl From<&SensorError> for sampler_common::Error {
    fn from(err: &SensorError) -> Self {
        match err {
            SensorError::Unavailable { .. } => sampler_common::Error::SensorUnavailable(err.to_string()),
            SensorError::Timeout { after } => sampler_common::Error::SensorTimeout {
                millis: after.as_millis() as u64,
            },
            _ => sampler_common::Error::SensorRead(err.to_string()),
        }
    }
}

/// Source of raw voltage readings.
pub trait SensorPort: Send {
    /// Acquire one reading in volts.
    fn read_volts(&mut self) -> Result<f64, SensorError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

impl<T: SensorPort + ?Sized> SensorPort for Box<T> {
    fn read_volts(&mut self) -> Result<f64, SensorError> {
        (**self).read_volts()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sampler_common::ErrorCategory;

    #[test]
    fn test_error_mapping() {
        let err = SensorError::Timeout {
            after: Duration::from_millis(250),
        };
        let common = sampler_common::Error::from(&err);
        assert_eq!(common.code(), 22);
        assert!(common.is_recoverable());

        let err = SensorError::Unavailable {
            device: PathBuf::from("/dev/null"),
            reason: "no channel".into(),
        };
        assert!(err.is_fatal());
        let common = sampler_common::Error::from(&err);
        assert_eq!(common.category(), ErrorCategory::Sensor);
        assert!(!common.is_recoverable());
    }

    #[test]
    fn test_timeout_message() {
        let err = SensorError::Timeout {
            after: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "sensor read timed out after 1500ms");
    }
}
