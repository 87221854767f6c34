//! ADS1115 through the Linux IIO subsystem.
//!
//! The kernel `ads1015` driver (which also binds the ADS1115) exposes one
//! directory per converter under `/sys/bus/iio/devices`. The single-ended
//! inputs AIN0-AIN3 are `in_voltage0_*` to `in_voltage3_*`; differential pairs
//! are named `in_voltage0-voltage1_*` and so on and are not used here.
//!
//! Per channel:
//! - `in_voltageN_raw`: signed conversion result
//! - `in_voltageN_scale`: millivolts per LSB (selects the PGA gain)
//! - `in_voltageN_sampling_frequency`: data rate in samples/s

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sampler_config::SensorSettings;
use tracing::{debug, warn};

use super::{SensorError, SensorPort};

#[derive(Debug)]
pub struct IioAdcSensor {
    device: PathBuf,
    raw_path: PathBuf,
    scale_mv: f64,
}

impl IioAdcSensor {
    /// Open the configured channel and program gain and data rate.
    ///
    /// Programming failures are logged and the driver's current settings are
    /// used instead; a missing channel is fatal.
    pub fn open(settings: &SensorSettings) -> Result<Self, SensorError> {
        let device = settings.iio_device.clone();
        let channel = settings.channel;
        let attr = |suffix: &str| device.join(format!("in_voltage{}_{}", channel, suffix));

        let raw_path = attr("raw");
        if !raw_path.exists() {
            return Err(SensorError::Unavailable {
                device,
                reason: format!("{} not found", raw_path.display()),
            });
        }

        let scale_path = attr("scale");
        let wanted_scale = settings.gain.scale_millivolts();
        if let Err(e) = fs::write(&scale_path, format!("{:.9}", wanted_scale)) {
            warn!(path = %scale_path.display(), error = %e, "cannot program ADC gain, using driver setting");
        }

        let rate_path = attr("sampling_frequency");
        if let Err(e) = fs::write(&rate_path, settings.data_rate.samples_per_sec().to_string()) {
            warn!(path = %rate_path.display(), error = %e, "cannot program ADC data rate, using driver setting");
        }

        let scale_mv = read_attr(&scale_path)
            .map_err(|e| SensorError::Unavailable {
                device: device.clone(),
                reason: format!("cannot read {}: {}", scale_path.display(), e),
            })
            .and_then(|s| parse_number(&s))?;

        debug!(
            device = %device.display(),
            channel = settings.channel,
            scale_mv,
            "IIO ADC channel opened"
        );

        Ok(IioAdcSensor {
            device,
            raw_path,
            scale_mv,
        })
    }

    /// Millivolts per LSB in effect.
    pub fn scale_mv(&self) -> f64 {
        self.scale_mv
    }
}

impl SensorPort for IioAdcSensor {
    fn read_volts(&mut self) -> Result<f64, SensorError> {
        let raw = read_attr(&self.raw_path).map_err(|e| SensorError::Read(e.to_string()))?;
        let counts = parse_number(&raw)?;
        Ok(counts * self.scale_mv / 1000.0)
    }

    fn describe(&self) -> String {
        format!("iio:{}", self.device.display())
    }
}

fn read_attr(path: &Path) -> io::Result<String> {
    fs::read_to_string(path)
}

fn parse_number(value: &str) -> Result<f64, SensorError> {
    let trimmed = value.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SensorError::Parse(trimmed.to_string()))
}
