use std::time::{Duration, Instant};

use chrono::Utc;
use sampler_math::{RollingAverage, UnitConverter};
use sampler_telemetry::{BatchStore, PendingBatch, Reading};
use tracing::{error, info, info_span, trace, warn};

use super::{pacing_delay, CycleError, CycleOutcome, LoopSummary, RetryPolicy, SmoothingWindow};
use crate::events::EventPublisher;
use crate::sensor::SensorPort;
use crate::shutdown::Shutdown;

/// Cadence and numbering for a [`SamplingLoop`].
#[derive(Debug, Clone)]
pub struct LoopSettings {
    /// Sampling period `T`.
    pub period: Duration,
    pub batch_size: usize,
    pub retry: RetryPolicy,
    /// Id used by the first cycle.
    pub first_batch_id: u64,
    /// Capacity of the raw-voltage diagnostic window.
    pub raw_window: usize,
}

pub struct SamplingLoop {
    sensor: Box<dyn SensorPort>,
    converter: UnitConverter,
    store: Box<dyn BatchStore>,
    publisher: EventPublisher,
    window: SmoothingWindow,
    raw_window: RollingAverage,
    period: Duration,
    batch_size: usize,
    retry: RetryPolicy,
    next_batch_id: u64,
    shutdown: Shutdown,
}

impl SamplingLoop {
    pub fn new(
        sensor: impl SensorPort + 'static,
        converter: UnitConverter,
        store: impl BatchStore + 'static,
        publisher: EventPublisher,
        window: SmoothingWindow,
        settings: LoopSettings,
        shutdown: Shutdown,
    ) -> Self {
        SamplingLoop {
            sensor: Box::new(sensor),
            converter,
            store: Box::new(store),
            publisher,
            window,
            raw_window: RollingAverage::new(settings.raw_window.max(1)),
            period: settings.period,
            batch_size: settings.batch_size,
            retry: settings.retry,
            next_batch_id: settings.first_batch_id,
            shutdown,
        }
    }

    /// Id the next cycle will use. Unchanged by a failed cycle.
    pub fn next_batch_id(&self) -> u64 {
        self.next_batch_id
    }

    /// Mean of the recent raw voltages.
    pub fn raw_mean(&self) -> Option<f64> {
        self.raw_window.mean()
    }

    /// Collect, seal, write and publish one batch.
    ///
    /// On error nothing is advanced: the pending readings are dropped and
    /// the next call reuses the same batch id. A batch file stays on disk
    /// only once its event has been enqueued.
    pub fn run_cycle(&mut self) -> Result<CycleOutcome, CycleError> {
        let batch_id = self.next_batch_id;
        let span = info_span!("cycle", batch_id);
        let _guard = span.enter();
        let started = Instant::now();

        let mut pending = PendingBatch::new(batch_id, self.batch_size)
            .map_err(|source| CycleError::Batch { batch_id, source })?;

        while !pending.is_full() {
            if self.shutdown.is_triggered() {
                return Err(CycleError::Interrupted {
                    batch_id,
                    collected: pending.len(),
                });
            }
            let tick_start = Instant::now();
            let wall_clock = Utc::now();

            let raw = self
                .sensor
                .read_volts()
                .map_err(|source| CycleError::Sensor { batch_id, source })?;
            let (corrected, pressure) = self.converter.convert(raw);
            if !corrected.is_finite() || !pressure.is_finite() {
                return Err(CycleError::Conversion { batch_id, raw });
            }

            self.raw_window.push(raw);
            self.window
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(pressure);
            pending
                .push(Reading::new(wall_clock, raw, corrected))
                .map_err(|source| CycleError::Batch { batch_id, source })?;
            trace!(raw, corrected, pressure, collected = pending.len(), "reading");

            if !self.shutdown.sleep(pacing_delay(self.period, tick_start.elapsed())) {
                return Err(CycleError::Interrupted {
                    batch_id,
                    collected: pending.len(),
                });
            }
        }

        let batch = pending
            .seal(Utc::now())
            .map_err(|source| CycleError::Batch { batch_id, source })?;
        let path = self
            .store
            .store(&batch)
            .map_err(|source| CycleError::Write { batch_id, source })?;
        let event = match self.publisher.publish(&path) {
            Ok(event) => event,
            Err(source) => {
                // The retry reuses this id, so the unannounced file must go.
                if let Err(e) = self.store.discard(&path) {
                    warn!(path = %path.display(), error = %e, "failed to withdraw unpublished batch file");
                }
                return Err(CycleError::Publish {
                    batch_id,
                    path,
                    source,
                });
            }
        };

        self.next_batch_id = batch_id
            .checked_add(1)
            .ok_or(CycleError::IdExhausted { batch_id })?;

        let elapsed = started.elapsed();
        info!(
            path = %path.display(),
            readings = batch.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            raw_mean = self.raw_window.mean().unwrap_or(f64::NAN),
            "batch published"
        );

        Ok(CycleOutcome {
            batch_id,
            path,
            event,
            readings: batch.len(),
            elapsed,
        })
    }

    /// Run cycles until shutdown or a non-retryable error.
    pub fn run(&mut self) -> LoopSummary {
        let mut summary = LoopSummary::default();
        info!(
            first_batch_id = self.next_batch_id,
            batch_size = self.batch_size,
            period_ms = self.period.as_millis() as u64,
            sensor = %self.sensor.describe(),
            sink = %self.publisher.describe(),
            "sampling loop started"
        );

        while !self.shutdown.is_triggered() {
            match self.run_cycle() {
                Ok(_) => summary.batches_published += 1,
                Err(e) if e.is_interrupted() => {
                    info!(batch_id = e.batch_id(), error = %e, "pending batch discarded on shutdown");
                    break;
                }
                Err(e) if !e.is_retryable() => {
                    error!(
                        batch_id = e.batch_id(),
                        code = e.code(),
                        error = %e,
                        detail = %e.structured().to_json(),
                        "sampling loop stopped"
                    );
                    summary.stopped_on_error = Some(e.to_string());
                    break;
                }
                Err(e) => {
                    summary.failed_cycles += 1;
                    warn!(
                        batch_id = e.batch_id(),
                        code = e.code(),
                        error = %e,
                        detail = %e.structured().to_json(),
                        retry_in_ms = self.retry.delay.as_millis() as u64,
                        "collection cycle failed; retrying same batch id"
                    );
                    if !self.shutdown.sleep(self.retry.delay) {
                        break;
                    }
                }
            }
        }

        summary.next_batch_id = self.next_batch_id;
        info!(
            batches_published = summary.batches_published,
            failed_cycles = summary.failed_cycles,
            next_batch_id = summary.next_batch_id,
            "sampling loop stopped"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChannelSink;
    use crate::sampler::smoothing_window;
    use crate::sensor::SensorError;
    use sampler_telemetry::{Batch, WriteError};
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    struct Constant(f64);

    impl SensorPort for Constant {
        fn read_volts(&mut self) -> Result<f64, SensorError> {
            Ok(self.0)
        }
        fn describe(&self) -> String {
            "constant".to_string()
        }
    }

    /// Records the batches it is given; fails the first `fail_first` calls.
    #[derive(Clone, Default)]
    struct MemoryStore {
        stored: Arc<Mutex<Vec<(u64, usize)>>>,
        discarded: Arc<Mutex<Vec<PathBuf>>>,
        fail_first: Arc<Mutex<usize>>,
    }

    impl BatchStore for MemoryStore {
        fn store(&mut self, batch: &Batch) -> Result<PathBuf, WriteError> {
            let mut remaining = self.fail_first.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(WriteError::InvalidPath("disk full".to_string()));
            }
            self.stored.lock().unwrap().push((batch.id(), batch.len()));
            Ok(PathBuf::from(format!("mem/Batch{}.csv", batch.id())))
        }

        fn discard(&mut self, path: &Path) -> Result<(), WriteError> {
            self.stored
                .lock()
                .unwrap()
                .retain(|(id, _)| path != Path::new(&format!("mem/Batch{}.csv", id)));
            self.discarded.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    fn settings(batch_size: usize, first: u64) -> LoopSettings {
        LoopSettings {
            period: Duration::ZERO,
            batch_size,
            retry: RetryPolicy {
                delay: Duration::from_millis(1),
            },
            first_batch_id: first,
            raw_window: 10,
        }
    }

    #[test]
    fn test_cycle_seals_exact_batch() {
        let store = MemoryStore::default();
        let (sink, rx) = ChannelSink::bounded(4);
        let window = smoothing_window(3);
        let mut sampler = SamplingLoop::new(
            Constant(1.0),
            UnitConverter::with_resistor(150.0),
            store.clone(),
            EventPublisher::new(sink, "E"),
            window.clone(),
            settings(3, 7),
            Shutdown::new(),
        );

        let outcome = sampler.run_cycle().unwrap();
        assert_eq!(outcome.batch_id, 7);
        assert_eq!(outcome.readings, 3);
        assert_eq!(sampler.next_batch_id(), 8);
        assert_eq!(*store.stored.lock().unwrap(), vec![(7, 3)]);
        assert!(rx.try_recv().unwrap().contains("Batch7.csv"));
        assert_eq!(window.lock().unwrap().len(), 3);
        assert_eq!(sampler.raw_mean(), Some(1.0));
    }

    #[test]
    fn test_failed_write_keeps_batch_id() {
        let store = MemoryStore::default();
        *store.fail_first.lock().unwrap() = 1;
        let (sink, _rx) = ChannelSink::bounded(4);
        let mut sampler = SamplingLoop::new(
            Constant(1.0),
            UnitConverter::with_resistor(150.0),
            store.clone(),
            EventPublisher::new(sink, "E"),
            smoothing_window(2),
            settings(2, 5),
            Shutdown::new(),
        );

        let err = sampler.run_cycle().unwrap_err();
        assert!(matches!(err, CycleError::Write { batch_id: 5, .. }));
        assert_eq!(sampler.next_batch_id(), 5);

        let outcome = sampler.run_cycle().unwrap();
        assert_eq!(outcome.batch_id, 5);
        assert_eq!(sampler.next_batch_id(), 6);
    }

    #[test]
    fn test_failed_publish_keeps_batch_id() {
        let store = MemoryStore::default();
        let (sink, rx) = ChannelSink::bounded(1);
        let mut sampler = SamplingLoop::new(
            Constant(1.0),
            UnitConverter::with_resistor(150.0),
            store.clone(),
            EventPublisher::new(sink, "E"),
            smoothing_window(2),
            settings(1, 1),
            Shutdown::new(),
        );
        sampler.run_cycle().unwrap();
        let err = sampler.run_cycle().unwrap_err();
        assert!(matches!(err, CycleError::Publish { batch_id: 2, .. }));
        assert_eq!(sampler.next_batch_id(), 2);
        assert_eq!(
            *store.discarded.lock().unwrap(),
            vec![PathBuf::from("mem/Batch2.csv")]
        );
        assert_eq!(*store.stored.lock().unwrap(), vec![(1, 1)]);

        rx.recv().unwrap();
        assert_eq!(sampler.run_cycle().unwrap().batch_id, 2);
        assert_eq!(*store.stored.lock().unwrap(), vec![(1, 1), (2, 1)]);
    }

    #[test]
    fn test_non_finite_conversion_abandons_cycle() {
        let (sink, _rx) = ChannelSink::bounded(1);
        let mut sampler = SamplingLoop::new(
            Constant(f64::INFINITY),
            UnitConverter::with_resistor(150.0),
            MemoryStore::default(),
            EventPublisher::new(sink, "E"),
            smoothing_window(2),
            settings(2, 1),
            Shutdown::new(),
        );
        assert!(matches!(
            sampler.run_cycle(),
            Err(CycleError::Conversion { batch_id: 1, .. })
        ));
    }

    #[test]
    fn test_shutdown_discards_pending_batch() {
        let store = MemoryStore::default();
        let (sink, rx) = ChannelSink::bounded(1);
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let mut sampler = SamplingLoop::new(
            Constant(1.0),
            UnitConverter::with_resistor(150.0),
            store.clone(),
            EventPublisher::new(sink, "E"),
            smoothing_window(2),
            settings(2, 3),
            shutdown,
        );
        let summary = sampler.run();
        assert_eq!(summary.batches_published, 0);
        assert_eq!(summary.next_batch_id, 3);
        assert!(store.stored.lock().unwrap().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_zero_batch_size_is_a_cycle_error() {
        let (sink, _rx) = ChannelSink::bounded(1);
        let mut sampler = SamplingLoop::new(
            Constant(1.0),
            UnitConverter::with_resistor(150.0),
            MemoryStore::default(),
            EventPublisher::new(sink, "E"),
            smoothing_window(2),
            settings(0, 1),
            Shutdown::new(),
        );
        assert!(matches!(
            sampler.run_cycle(),
            Err(CycleError::Batch { batch_id: 1, .. })
        ));
    }
}
