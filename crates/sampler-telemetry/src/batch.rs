//! Readings and batches.
//!
//! Readings accumulate in a [`PendingBatch`]. Only [`PendingBatch::seal`]
//! produces a [`Batch`], and it refuses unless exactly the target number of
//! readings is present, so a writer can never receive a short batch.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from batch accumulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BatchError {
    #[error("batch target size must be positive")]
    ZeroTarget,

    #[error("batch {id} is full ({target} readings)")]
    Overflow { id: u64, target: usize },

    #[error("batch {id} has {actual} of {expected} readings")]
    Incomplete {
        id: u64,
        expected: usize,
        actual: usize,
    },
}

/// One acquired sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Wall-clock time at tick start, truncated to microseconds.
    pub timestamp: DateTime<Utc>,
    /// Uncalibrated sensor voltage.
    pub raw: f64,
    /// Calibrated voltage; this is the value written to the batch file.
    pub corrected: f64,
}

impl Reading {
    pub fn new(timestamp: DateTime<Utc>, raw: f64, corrected: f64) -> Self {
        Reading {
            timestamp: timestamp.trunc_subsecs(6),
            raw,
            corrected,
        }
    }
}

/// Upper bound on readings reserved up front; larger batches grow on push.
const MAX_PREALLOCATED_READINGS: usize = 4096;

/// Batch under construction.
#[derive(Debug, Clone)]
pub struct PendingBatch {
    id: u64,
    target: usize,
    readings: Vec<Reading>,
}

impl PendingBatch {
    pub fn new(id: u64, target: usize) -> Result<Self, BatchError> {
        if target == 0 {
            return Err(BatchError::ZeroTarget);
        }
        Ok(PendingBatch {
            id,
            target,
            readings: Vec::with_capacity(target.min(MAX_PREALLOCATED_READINGS)),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.readings.len() >= self.target
    }

    /// Append a reading. Fails once the target is reached.
    pub fn push(&mut self, reading: Reading) -> Result<(), BatchError> {
        if self.is_full() {
            return Err(BatchError::Overflow {
                id: self.id,
                target: self.target,
            });
        }
        self.readings.push(reading);
        Ok(())
    }

    /// Freeze the batch. `created_at` becomes the filename timestamp.
    pub fn seal(self, created_at: DateTime<Utc>) -> Result<Batch, BatchError> {
        if self.readings.len() != self.target {
            return Err(BatchError::Incomplete {
                id: self.id,
                expected: self.target,
                actual: self.readings.len(),
            });
        }
        Ok(Batch {
            id: self.id,
            readings: self.readings,
            created_at,
        })
    }
}

/// A sealed, immutable batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    id: u64,
    readings: Vec<Reading>,
    created_at: DateTime<Utc>,
}

impl Batch {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Readings in append order.
    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
