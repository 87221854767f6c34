//! ADC sampler configuration loading and validation.
//!
//! This crate provides:
//! - Typed settings for acquisition, batching, display and queue
//! - Resolution from the process environment (or any lookup function)
//! - Semantic validation with field-level errors
//! - Config snapshots for startup logging

pub mod options;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use options::{AdcGain, DataRate, DisplayKind, SensorKind};
pub use resolve::{
    resolve_config, BatchSettings, CalibrationSettings, ConfigSource, DisplaySettings,
    QueueSettings, SamplerConfig, SamplingSettings, SensorSettings,
};
pub use snapshot::ConfigSnapshot;
pub use validate::{ValidationError, ValidationResult};
