//! Config snapshot for startup logging.
//!
//! The snapshot carries everything an operator needs to reproduce a run
//! except secrets; the queue auth key is never included.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::resolve::{ConfigSource, SamplerConfig};

/// Serializable summary of a resolved configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub device_id: Option<String>,
    pub batch_size: usize,
    pub batch_prefix: String,
    pub sampling_period_ms: f64,
    pub retry_delay_ms: u64,
    pub smoothing_window: usize,
    pub timezone: String,
    pub output_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub sensor_kind: String,
    pub adc_gain: String,
    pub adc_data_rate: u16,
    pub adc_channel: u8,
    pub read_timeout_ms: u64,
    pub resistor_ohms: f64,
    pub display_kind: String,
    pub display_refresh_ms: u64,
    pub queue_endpoint: String,
    pub event_type: String,
    /// Variables that fell back to built-in defaults.
    pub defaulted: Vec<String>,
}

impl From<&SamplerConfig> for ConfigSnapshot {
    fn from(config: &SamplerConfig) -> Self {
        let defaulted = config
            .sources
            .iter()
            .filter(|(_, source)| **source == ConfigSource::BuiltinDefault)
            .map(|(key, _)| key.to_string())
            .collect();

        ConfigSnapshot {
            device_id: config.device_id(),
            batch_size: config.batch.size,
            batch_prefix: config.batch.prefix.clone(),
            sampling_period_ms: config.sampling.period.as_secs_f64() * 1000.0,
            retry_delay_ms: config.sampling.retry_delay.as_millis() as u64,
            smoothing_window: config.sampling.smoothing_window,
            timezone: config.batch.timezone.name().to_string(),
            output_dir: config.batch.output_dir.clone(),
            backup_dir: config.batch.backup_dir.clone(),
            sensor_kind: config.sensor.kind.to_string(),
            adc_gain: config.sensor.gain.to_string(),
            adc_data_rate: config.sensor.data_rate.samples_per_sec(),
            adc_channel: config.sensor.channel,
            read_timeout_ms: config.sensor.read_timeout.as_millis() as u64,
            resistor_ohms: config.calibration.resistor_ohms,
            display_kind: config.display.kind.to_string(),
            display_refresh_ms: config.display.refresh.as_millis() as u64,
            queue_endpoint: format!("{}:{}", config.queue.host, config.queue.port),
            event_type: config.queue.event_type.clone(),
            defaulted,
        }
    }
}

impl ConfigSnapshot {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
