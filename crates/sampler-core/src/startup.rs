//! Startup wiring: turns a resolved configuration into a runnable sampler.
//!
//! Every failure here is fatal and maps to a distinct exit code. Nothing in
//! this module retries; the service manager restarts the process.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sampler_config::{ConfigSnapshot, DisplayKind, SamplerConfig, SensorKind, ValidationError};
use sampler_math::UnitConverter;
use sampler_telemetry::{BatchNumberResolver, BatchWriter, ResolveError, WriterConfig};
use thiserror::Error;
use tracing::info;

use crate::display::{DisplayError, DisplayLayout, DisplayPort, DisplayUpdater, FrameFileDisplay, NullDisplay};
use crate::events::{EventPublisher, PublishError, TcpQueueSink};
use crate::exit_codes::ExitCode;
use crate::logging::LoggingError;
use crate::sampler::{smoothing_window, LoopSettings, RetryPolicy, SamplingLoop, SmoothingWindow};
use crate::sensor::{IioAdcSensor, SensorError, SensorPort, SimulatedSensor, TimedSensor};
use crate::shutdown::Shutdown;

/// Connect timeout for the queue at startup and on reconnect.
pub const QUEUE_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound on a single event write.
pub const QUEUE_WRITE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ValidationError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error("cannot install signal handlers: {0}")]
    Signals(#[source] io::Error),

    #[error("cannot create directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Sensor(#[from] SensorError),

    #[error(transparent)]
    Display(#[from] DisplayError),

    #[error(transparent)]
    Queue(#[from] PublishError),

    #[error("cannot start {name} thread: {source}")]
    Thread {
        name: &'static str,
        #[source]
        source: io::Error,
    },
}

impl StartupError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            StartupError::Config(_) | StartupError::Logging(_) => ExitCode::ConfigError,
            StartupError::Directory { .. } | StartupError::Resolve(_) => ExitCode::StorageError,
            StartupError::Sensor(_) | StartupError::Display(_) => ExitCode::HardwareError,
            StartupError::Queue(_) => ExitCode::QueueError,
            StartupError::Signals(_) | StartupError::Thread { .. } => ExitCode::InternalError,
        }
    }
}

impl From<&StartupError> for sampler_common::Error {
    fn from(err: &StartupError) -> Self {
        use sampler_common::Error;
        match err {
            StartupError::Config(ValidationError::MissingField(field)) => {
                Error::MissingVariable(field.clone())
            }
            StartupError::Config(_) | StartupError::Logging(_) => Error::Config(err.to_string()),
            StartupError::Directory { .. } => Error::Storage(err.to_string()),
            StartupError::Resolve(_) => Error::Recovery(err.to_string()),
            StartupError::Sensor(e) => e.into(),
            StartupError::Display(e) => e.into(),
            StartupError::Queue(e) => e.into(),
            StartupError::Signals(source) | StartupError::Thread { source, .. } => {
                Error::Io(io::Error::new(source.kind(), err.to_string()))
            }
        }
    }
}

/// Everything `main` needs to run.
pub struct Runtime {
    pub sampling: SamplingLoop,
    pub display: DisplayUpdater,
    pub display_refresh: Duration,
}

/// Create the output and backup directories.
pub fn prepare_directories(config: &SamplerConfig) -> Result<(), StartupError> {
    for dir in [&config.batch.output_dir, &config.batch.backup_dir] {
        create_dir(dir)?;
    }
    Ok(())
}

fn create_dir(path: &Path) -> Result<(), StartupError> {
    fs::create_dir_all(path).map_err(|source| StartupError::Directory {
        path: path.to_path_buf(),
        source,
    })
}

/// Next batch id, taken over the backup and output directories.
pub fn resolve_first_batch_id(config: &SamplerConfig) -> Result<u64, StartupError> {
    let resolver = BatchNumberResolver::new(&config.batch.prefix)?;
    let id = resolver.next_batch_id_across(&[&config.batch.backup_dir, &config.batch.output_dir])?;
    Ok(id)
}

/// Open the configured sensor behind a read timeout.
pub fn open_sensor(config: &SamplerConfig) -> Result<TimedSensor, StartupError> {
    let settings = &config.sensor;
    let sensor: Box<dyn SensorPort> = match settings.kind {
        SensorKind::Iio => Box::new(IioAdcSensor::open(settings)?),
        SensorKind::Simulated => Box::new(SimulatedSensor::default()),
    };
    info!(sensor = %sensor.describe(), timeout_ms = settings.read_timeout.as_millis() as u64, "sensor ready");
    Ok(TimedSensor::spawn(sensor, settings.read_timeout)?)
}

/// Open the configured display and draw the static layout.
pub fn open_display(
    config: &SamplerConfig,
    window: SmoothingWindow,
) -> Result<DisplayUpdater, StartupError> {
    let display: Box<dyn DisplayPort> = match config.display.kind {
        DisplayKind::Frame => Box::new(FrameFileDisplay::open(&config.display.frame_path)?),
        DisplayKind::None => Box::new(NullDisplay),
    };
    let mut updater = DisplayUpdater::new(display, DisplayLayout::default(), window);
    updater.init()?;
    info!(kind = %config.display.kind, path = %config.display.frame_path.display(), "display ready");
    Ok(updater)
}

pub fn connect_queue(config: &SamplerConfig) -> Result<EventPublisher, StartupError> {
    let queue = &config.queue;
    let sink = TcpQueueSink::connect(
        &queue.host,
        queue.port,
        &queue.auth_key,
        QUEUE_CONNECT_TIMEOUT,
        QUEUE_WRITE_TIMEOUT,
    )?;
    Ok(EventPublisher::new(sink, queue.event_type.as_str()))
}

/// Build the runtime from `config`. The display thread is not started.
pub fn build_runtime(config: &SamplerConfig, shutdown: Shutdown) -> Result<Runtime, StartupError> {
    let snapshot = ConfigSnapshot::from(config);
    info!(
        device_id = snapshot.device_id.as_deref().unwrap_or("unknown"),
        config = %snapshot.to_json(),
        "configuration resolved"
    );

    prepare_directories(config)?;
    let first_batch_id = resolve_first_batch_id(config)?;
    info!(first_batch_id, backup_dir = %config.batch.backup_dir.display(), "batch numbering resumed");

    let sensor = open_sensor(config)?;
    let window = smoothing_window(config.sampling.smoothing_window);
    let display = open_display(config, window.clone())?;
    let publisher = connect_queue(config)?;

    let calibration = &config.calibration;
    let converter = UnitConverter::new(calibration.gain, calibration.offset, calibration.resistor_ohms);
    let writer = BatchWriter::new(WriterConfig::new(
        config.batch.output_dir.clone(),
        config.batch.prefix.as_str(),
        config.batch.timezone,
    ));

    let sampling = SamplingLoop::new(
        sensor,
        converter,
        writer,
        publisher,
        window,
        LoopSettings {
            period: config.sampling.period,
            batch_size: config.batch.size,
            retry: RetryPolicy {
                delay: config.sampling.retry_delay,
            },
            first_batch_id,
            raw_window: config.sampling.smoothing_window,
        },
        shutdown,
    );

    Ok(Runtime {
        sampling,
        display,
        display_refresh: config.display.refresh,
    })
}
