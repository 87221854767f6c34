//! Simulated sensor for bench runs without an ADC attached.

use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{SensorError, SensorPort};

/// Constant baseline plus uniform noise.
#[derive(Debug)]
pub struct SimulatedSensor {
    baseline: f64,
    noise: f64,
    latency: Option<Duration>,
    rng: StdRng,
}

impl SimulatedSensor {
    /// 3 V across a 250 ohm shunt is 12 mA, mid-scale on a 4-20 mA loop.
    pub const DEFAULT_BASELINE_VOLTS: f64 = 3.0;
    pub const DEFAULT_NOISE_VOLTS: f64 = 0.01;

    pub fn new(baseline: f64, noise: f64) -> Self {
        SimulatedSensor {
            baseline,
            noise: noise.abs(),
            latency: None,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic noise sequence.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Block for `latency` on every read, like a real conversion.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASELINE_VOLTS, Self::DEFAULT_NOISE_VOLTS)
    }
}

impl SensorPort for SimulatedSensor {
    fn read_volts(&mut self) -> Result<f64, SensorError> {
        if let Some(latency) = self.latency {
            thread::sleep(latency);
        }
        if self.noise == 0.0 {
            return Ok(self.baseline);
        }
        Ok(self.baseline + self.rng.random_range(-self.noise..=self.noise))
    }

    fn describe(&self) -> String {
        format!("simulated:{}V±{}", self.baseline, self.noise)
    }
}
