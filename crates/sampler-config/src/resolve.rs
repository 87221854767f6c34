//! Configuration resolution from environment variables.
//!
//! All configuration is read once at startup. Resolution takes a lookup
//! function so that tests can feed a map instead of mutating the process
//! environment; [`SamplerConfig::from_env`] is the production entry point.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use regex::Regex;

use crate::options::{AdcGain, DataRate, DisplayKind, SensorKind};
use crate::validate::{validate_config, ValidationError, ValidationResult};

/// Environment variable names.
pub mod vars {
    pub const BATCH_SIZE: &str = "BATCH_SIZE";
    pub const SAMPLING_RATE: &str = "SAMPLING_RATE";
    pub const TIMEZONE: &str = "TIMEZONE";
    pub const OUTPUT_DIR: &str = "FILE_DIRECTORY_ADC_BATCHES";
    pub const BACKUP_DIR: &str = "FILE_DIRECTORY_ADC_BATCHES_BACKUP";
    pub const RESISTOR_VALUE: &str = "RESISTOR_VALUE";
    pub const EVENT_TYPE: &str = "ADC_BATCH_CREATED_EVENT";
    pub const QUEUE_HOST: &str = "QUEUE_HOST";
    pub const QUEUE_PORT: &str = "QUEUE_PORT";
    pub const AUTH_KEY: &str = "AUTH_KEY";

    pub const BATCH_FILE_PREFIX: &str = "BATCH_FILE_PREFIX";
    pub const ADC_GAIN: &str = "ADC_GAIN";
    pub const ADC_DATA_RATE: &str = "ADC_DATA_RATE";
    pub const ADC_CHANNEL: &str = "ADC_CHANNEL";
    pub const SENSOR_KIND: &str = "SENSOR_KIND";
    pub const SENSOR_IIO_DEVICE: &str = "SENSOR_IIO_DEVICE";
    pub const SENSOR_READ_TIMEOUT_MS: &str = "SENSOR_READ_TIMEOUT_MS";
    pub const DISPLAY_KIND: &str = "DISPLAY_KIND";
    pub const DISPLAY_FRAME_PATH: &str = "DISPLAY_FRAME_PATH";
    pub const DISPLAY_REFRESH_SECS: &str = "DISPLAY_REFRESH_SECS";
    pub const SMOOTHING_WINDOW: &str = "SMOOTHING_WINDOW";
    pub const RETRY_DELAY_SECS: &str = "RETRY_DELAY_SECS";
    pub const CALIBRATION_GAIN: &str = "CALIBRATION_GAIN";
    pub const CALIBRATION_OFFSET: &str = "CALIBRATION_OFFSET";
    pub const LOG_DIRECTORY: &str = "LOG_DIRECTORY";
}

/// Defaults for optional variables.
pub const DEFAULT_BATCH_FILE_PREFIX: &str = "BFA1_";
pub const DEFAULT_IIO_DEVICE: &str = "/sys/bus/iio/devices/iio:device0";
pub const DEFAULT_ADC_CHANNEL: u8 = 1;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_DISPLAY_REFRESH_SECS: f64 = 3.0;
pub const DEFAULT_SMOOTHING_WINDOW: usize = 100;
pub const DEFAULT_RETRY_DELAY_SECS: f64 = 5.0;
pub const DEFAULT_CALIBRATION_GAIN: f64 = 0.9295;
pub const DEFAULT_CALIBRATION_OFFSET: f64 = 0.0093;
const DISPLAY_FRAME_FILENAME: &str = "display.txt";

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Set via environment variable.
    Environment,
    /// Using built-in default.
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Batch sizing, naming and directories.
#[derive(Debug, Clone)]
pub struct BatchSettings {
    /// Readings per batch.
    pub size: usize,
    /// Filename prefix placed before `Batch<id>`.
    pub prefix: String,
    /// Live output directory consumed downstream.
    pub output_dir: PathBuf,
    /// Archive directory used to recover the next batch id.
    pub backup_dir: PathBuf,
    /// Timezone used for the filename timestamp.
    pub timezone: Tz,
}

/// Loop cadence and retry policy.
#[derive(Debug, Clone)]
pub struct SamplingSettings {
    /// Sampling period `T`.
    pub period: Duration,
    /// Backoff after a failed collection cycle.
    pub retry_delay: Duration,
    /// Capacity of the smoothing window shown on the display.
    pub smoothing_window: usize,
}

/// ADC adapter settings.
#[derive(Debug, Clone)]
pub struct SensorSettings {
    pub kind: SensorKind,
    pub iio_device: PathBuf,
    pub channel: u8,
    pub gain: AdcGain,
    pub data_rate: DataRate,
    /// Upper bound for a single acquisition.
    pub read_timeout: Duration,
}

/// Unit conversion constants.
#[derive(Debug, Clone, Copy)]
pub struct CalibrationSettings {
    /// Affine slope applied to the raw voltage.
    pub gain: f64,
    /// Affine offset applied to the raw voltage.
    pub offset: f64,
    /// Current-loop shunt resistor in ohms.
    pub resistor_ohms: f64,
}

/// Display adapter settings.
#[derive(Debug, Clone)]
pub struct DisplaySettings {
    pub kind: DisplayKind,
    pub frame_path: PathBuf,
    /// Display refresh period `D`.
    pub refresh: Duration,
}

/// Downstream queue connection and event naming.
#[derive(Clone)]
pub struct QueueSettings {
    pub host: String,
    pub port: u16,
    pub auth_key: String,
    /// `event_type` stamped on every published event.
    pub event_type: String,
}

impl std::fmt::Debug for QueueSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("auth_key", &"<redacted>")
            .field("event_type", &self.event_type)
            .finish()
    }
}

/// Fully resolved sampler configuration.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub batch: BatchSettings,
    pub sampling: SamplingSettings,
    pub sensor: SensorSettings,
    pub calibration: CalibrationSettings,
    pub display: DisplaySettings,
    pub queue: QueueSettings,
    /// Provenance of every variable consulted.
    pub sources: BTreeMap<&'static str, ConfigSource>,
}

impl SamplerConfig {
    /// Resolve and validate from the process environment.
    pub fn from_env() -> ValidationResult<Self> {
        resolve_config(|key| std::env::var(key).ok())
    }

    /// Device identity encoded in the filename prefix (e.g. `BFA1` for `BFA1_`).
    pub fn device_id(&self) -> Option<String> {
        device_id_from_prefix(&self.batch.prefix)
    }
}

/// Extract the leading letters+digits token of a batch prefix.
pub fn device_id_from_prefix(prefix: &str) -> Option<String> {
    let re = Regex::new(r"^([A-Za-z]+[0-9]+)").ok()?;
    re.captures(prefix)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Reads variables and records where each came from.
struct Resolver<F> {
    lookup: F,
    sources: BTreeMap<&'static str, ConfigSource>,
}

impl<F> Resolver<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&mut self, key: &'static str) -> Option<String> {
        match (self.lookup)(key) {
            Some(value) if !value.trim().is_empty() => {
                self.sources.insert(key, ConfigSource::Environment);
                Some(value.trim().to_string())
            }
            _ => None,
        }
    }

    fn required(&mut self, key: &'static str) -> ValidationResult<String> {
        self.raw(key)
            .ok_or_else(|| ValidationError::MissingField(key.to_string()))
    }

    fn required_parsed<T>(&mut self, key: &'static str) -> ValidationResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.required(key)?;
        parse_value(key, &raw)
    }

    fn optional_parsed<T>(&mut self, key: &'static str, default: T) -> ValidationResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.raw(key) {
            Some(raw) => parse_value(key, &raw),
            None => {
                self.sources.insert(key, ConfigSource::BuiltinDefault);
                Ok(default)
            }
        }
    }

    fn optional_secs(&mut self, key: &'static str, default: f64) -> ValidationResult<Duration> {
        let secs: f64 = self.optional_parsed(key, default)?;
        seconds(key, secs)
    }
}

fn parse_value<T>(key: &str, raw: &str) -> ValidationResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ValidationError::ParseError {
        field: key.to_string(),
        message: format!("'{}': {}", raw, e),
    })
}

fn seconds(key: &str, secs: f64) -> ValidationResult<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: key.to_string(),
            message: format!("must be a positive number of seconds, got {}", secs),
        });
    }
    Duration::try_from_secs_f64(secs).map_err(|e| ValidationError::InvalidValue {
        field: key.to_string(),
        message: e.to_string(),
    })
}

/// Resolve configuration from a lookup function and validate it.
///
/// Required variables fail with [`ValidationError::MissingField`]; optional
/// variables fall back to built-in defaults and are recorded as such in
/// [`SamplerConfig::sources`].
pub fn resolve_config<F>(lookup: F) -> ValidationResult<SamplerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut r = Resolver {
        lookup,
        sources: BTreeMap::new(),
    };

    let size: usize = r.required_parsed(vars::BATCH_SIZE)?;
    let period_secs: f64 = r.required_parsed(vars::SAMPLING_RATE)?;
    let period = seconds(vars::SAMPLING_RATE, period_secs)?;
    let timezone: Tz = r.required_parsed(vars::TIMEZONE)?;
    let output_dir = PathBuf::from(r.required(vars::OUTPUT_DIR)?);
    let backup_dir = PathBuf::from(r.required(vars::BACKUP_DIR)?);
    let resistor_ohms: f64 = r.required_parsed(vars::RESISTOR_VALUE)?;
    let event_type = r.required(vars::EVENT_TYPE)?;
    let host = r.required(vars::QUEUE_HOST)?;
    let port: u16 = r.required_parsed(vars::QUEUE_PORT)?;
    let auth_key = r.required(vars::AUTH_KEY)?;

    let prefix = r.optional_parsed(vars::BATCH_FILE_PREFIX, DEFAULT_BATCH_FILE_PREFIX.to_string())?;
    let gain: AdcGain = r.optional_parsed(vars::ADC_GAIN, AdcGain::default())?;
    let data_rate: DataRate = r.optional_parsed(vars::ADC_DATA_RATE, DataRate::default())?;
    let channel: u8 = r.optional_parsed(vars::ADC_CHANNEL, DEFAULT_ADC_CHANNEL)?;
    let kind: SensorKind = r.optional_parsed(vars::SENSOR_KIND, SensorKind::default())?;
    let iio_device: PathBuf = r.optional_parsed(vars::SENSOR_IIO_DEVICE, PathBuf::from(DEFAULT_IIO_DEVICE))?;
    let timeout_ms: u64 = r.optional_parsed(vars::SENSOR_READ_TIMEOUT_MS, DEFAULT_READ_TIMEOUT_MS)?;

    let display_kind: DisplayKind = r.optional_parsed(vars::DISPLAY_KIND, DisplayKind::default())?;
    let default_frame = r
        .raw(vars::LOG_DIRECTORY)
        .map(|dir| PathBuf::from(dir).join(DISPLAY_FRAME_FILENAME))
        .unwrap_or_else(|| std::env::temp_dir().join(DISPLAY_FRAME_FILENAME));
    let frame_path: PathBuf = r.optional_parsed(vars::DISPLAY_FRAME_PATH, default_frame)?;
    let refresh = r.optional_secs(vars::DISPLAY_REFRESH_SECS, DEFAULT_DISPLAY_REFRESH_SECS)?;

    let smoothing_window: usize = r.optional_parsed(vars::SMOOTHING_WINDOW, DEFAULT_SMOOTHING_WINDOW)?;
    let retry_delay = r.optional_secs(vars::RETRY_DELAY_SECS, DEFAULT_RETRY_DELAY_SECS)?;
    let cal_gain: f64 = r.optional_parsed(vars::CALIBRATION_GAIN, DEFAULT_CALIBRATION_GAIN)?;
    let cal_offset: f64 = r.optional_parsed(vars::CALIBRATION_OFFSET, DEFAULT_CALIBRATION_OFFSET)?;

    let config = SamplerConfig {
        batch: BatchSettings {
            size,
            prefix,
            output_dir,
            backup_dir,
            timezone,
        },
        sampling: SamplingSettings {
            period,
            retry_delay,
            smoothing_window,
        },
        sensor: SensorSettings {
            kind,
            iio_device,
            channel,
            gain,
            data_rate,
            read_timeout: Duration::from_millis(timeout_ms),
        },
        calibration: CalibrationSettings {
            gain: cal_gain,
            offset: cal_offset,
            resistor_ohms,
        },
        display: DisplaySettings {
            kind: display_kind,
            frame_path,
            refresh,
        },
        queue: QueueSettings {
            host,
            port,
            auth_key,
            event_type,
        },
        sources: r.sources,
    };

    validate_config(&config)?;
    Ok(config)
}
