//! Sampling-and-batching control loop.
//!
//! One collection cycle acquires `batch_size` readings at a fixed period,
//! seals them into a batch, writes the batch file and publishes one event.
//! A failed cycle is abandoned and retried with the same batch id after a
//! fixed backoff; see [`SamplingLoop::run`].

mod control;

pub use control::{LoopSettings, SamplingLoop};

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sampler_common::StructuredError;
use sampler_math::RollingAverage;
use sampler_telemetry::{BatchError, WriteError};
use thiserror::Error;

use crate::events::{BatchEvent, PublishError};
use crate::sensor::SensorError;

/// Smoothing window shared by the loop (writer) and the display (reader).
pub type SmoothingWindow = Arc<Mutex<RollingAverage>>;

/// New shared window that is ready once it holds `capacity` values.
pub fn smoothing_window(capacity: usize) -> SmoothingWindow {
    Arc::new(Mutex::new(RollingAverage::new(capacity)))
}

/// Time left in the tick after `elapsed` of work. Zero for a slow tick;
/// missed ticks are never made up.
pub fn pacing_delay(period: Duration, elapsed: Duration) -> Duration {
    period.saturating_sub(elapsed)
}

/// Backoff applied after a failed collection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            delay: Duration::from_secs(5),
        }
    }
}

/// Why a collection cycle was abandoned.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("batch {batch_id}: {source}")]
    Batch {
        batch_id: u64,
        #[source]
        source: BatchError,
    },

    #[error("batch {batch_id}: {source}")]
    Sensor {
        batch_id: u64,
        #[source]
        source: SensorError,
    },

    #[error("batch {batch_id}: raw reading {raw} converted to a non-finite value")]
    Conversion { batch_id: u64, raw: f64 },

    #[error("batch {batch_id}: {source}")]
    Write {
        batch_id: u64,
        #[source]
        source: WriteError,
    },

    #[error("batch {batch_id}: publishing {} failed: {source}", .path.display())]
    Publish {
        batch_id: u64,
        path: PathBuf,
        #[source]
        source: PublishError,
    },

    #[error("batch {batch_id}: interrupted after {collected} readings")]
    Interrupted { batch_id: u64, collected: usize },

    #[error("batch id space exhausted at {batch_id}")]
    IdExhausted { batch_id: u64 },
}

impl CycleError {
    pub fn batch_id(&self) -> u64 {
        match self {
            CycleError::Batch { batch_id, .. }
            | CycleError::Sensor { batch_id, .. }
            | CycleError::Conversion { batch_id, .. }
            | CycleError::Write { batch_id, .. }
            | CycleError::Publish { batch_id, .. }
            | CycleError::Interrupted { batch_id, .. }
            | CycleError::IdExhausted { batch_id } => *batch_id,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, CycleError::Interrupted { .. })
    }

    /// Whether the loop backs off and retries the same id.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            CycleError::Interrupted { .. } | CycleError::IdExhausted { .. }
        )
    }

    /// Stable code for log records.
    pub fn code(&self) -> u32 {
        self.to_common().code()
    }

    /// Machine-readable record for the failure log line.
    pub fn structured(&self) -> StructuredError {
        let record = StructuredError::from(&self.to_common()).with_context("batch_id", self.batch_id());
        match self {
            CycleError::Publish { path, .. } => record.with_context("path", path.display().to_string()),
            _ => record,
        }
    }

    fn to_common(&self) -> sampler_common::Error {
        match self {
            CycleError::Sensor { source, .. } => source.into(),
            CycleError::Publish { source, .. } => source.into(),
            CycleError::Conversion { .. } => sampler_common::Error::SensorRead(self.to_string()),
            CycleError::Batch { .. }
            | CycleError::Write { .. }
            | CycleError::Interrupted { .. }
            | CycleError::IdExhausted { .. } => sampler_common::Error::Storage(self.to_string()),
        }
    }
}

/// A published batch.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub batch_id: u64,
    pub path: PathBuf,
    pub event: BatchEvent,
    pub readings: usize,
    pub elapsed: Duration,
}

/// What [`SamplingLoop::run`] did before returning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub batches_published: u64,
    pub failed_cycles: u64,
    /// Id the next cycle would have used.
    pub next_batch_id: u64,
    /// Set when the loop stopped on a non-retryable error.
    pub stopped_on_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pacing_delay() {
        let period = Duration::from_millis(100);
        assert_eq!(
            pacing_delay(period, Duration::from_millis(30)),
            Duration::from_millis(70)
        );
        assert_eq!(pacing_delay(period, period), Duration::ZERO);
        assert_eq!(pacing_delay(period, Duration::from_secs(2)), Duration::ZERO);
    }

    #[test]
    fn test_retry_default() {
        assert_eq!(RetryPolicy::default().delay, Duration::from_secs(5));
    }

    #[test]
    fn test_cycle_error_classification() {
        let interrupted = CycleError::Interrupted {
            batch_id: 4,
            collected: 2,
        };
        assert!(interrupted.is_interrupted());
        assert!(!interrupted.is_retryable());
        assert_eq!(interrupted.batch_id(), 4);

        let sensor = CycleError::Sensor {
            batch_id: 9,
            source: SensorError::Timeout {
                after: Duration::from_millis(5),
            },
        };
        assert!(sensor.is_retryable());
        assert_eq!(sensor.code(), 22);
        assert!(sensor.to_string().starts_with("batch 9:"));

        assert!(!CycleError::IdExhausted { batch_id: u64::MAX }.is_retryable());
    }

    #[test]
    fn test_structured_record_carries_batch_id() {
        let err = CycleError::Sensor {
            batch_id: 12,
            source: SensorError::Timeout {
                after: Duration::from_millis(250),
            },
        };
        let record = err.structured();
        assert_eq!(record.code, err.code());
        assert!(record.recoverable);
        assert_eq!(record.context["batch_id"], serde_json::json!(12));
        assert_eq!(record.context["timeout_ms"], serde_json::json!(250));

        let json: serde_json::Value = serde_json::from_str(&record.to_json()).unwrap();
        assert_eq!(json["code"], serde_json::json!(err.code()));
        assert_eq!(json["context"]["batch_id"], serde_json::json!(12));
    }
}
