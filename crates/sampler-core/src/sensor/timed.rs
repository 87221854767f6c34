//! Time-bounded sensor reads.
//!
//! A bus read can hang (clock stretching, a wedged driver). [`TimedSensor`]
//! moves the wrapped adapter onto a worker thread and waits at most
//! `timeout` for each answer. Requests carry a sequence number; an answer
//! that arrives after its request timed out is discarded when the next
//! request is waiting, so a late value is never attributed to a later tick.
//! Requests that pile up behind a hung read are collapsed into the newest
//! one, so a recovered bus is read once, not once per missed tick.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use super::{SensorError, SensorPort};

type Response = (u64, Result<f64, SensorError>);

pub struct TimedSensor {
    requests: Sender<u64>,
    responses: Receiver<Response>,
    timeout: Duration,
    next_seq: u64,
    description: String,
}

impl TimedSensor {
    /// Move `sensor` onto a worker thread.
    pub fn spawn<S>(mut sensor: S, timeout: Duration) -> Result<Self, SensorError>
    where
        S: SensorPort + 'static,
    {
        let description = sensor.describe();
        let (req_tx, req_rx) = mpsc::channel::<u64>();
        let (resp_tx, resp_rx) = mpsc::channel::<Response>();

        thread::Builder::new()
            .name("sampler-sensor".to_string())
            .spawn(move || {
                while let Ok(mut seq) = req_rx.recv() {
                    // Only the newest request still has a caller waiting.
                    while let Ok(newer) = req_rx.try_recv() {
                        seq = newer;
                    }
                    let result = sensor.read_volts();
                    if resp_tx.send((seq, result)).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| SensorError::Read(format!("failed to spawn sensor worker: {}", e)))?;

        Ok(TimedSensor {
            requests: req_tx,
            responses: resp_rx,
            timeout,
            next_seq: 0,
            description,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl SensorPort for TimedSensor {
    fn read_volts(&mut self) -> Result<f64, SensorError> {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.requests
            .send(seq)
            .map_err(|_| SensorError::Disconnected)?;

        let deadline = Instant::now() + self.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.responses.recv_timeout(remaining) {
                Ok((answered, result)) if answered == seq => return result,
                Ok((stale, _)) => {
                    debug!(seq = stale, "discarding late sensor response");
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(SensorError::Timeout {
                        after: self.timeout,
                    })
                }
                Err(RecvTimeoutError::Disconnected) => return Err(SensorError::Disconnected),
            }
        }
    }

    fn describe(&self) -> String {
        format!("{} (timeout {}ms)", self.description, self.timeout.as_millis())
    }
}
