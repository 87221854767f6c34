//! Raw-reading to engineering-unit conversion.
//!
//! Two quantities are derived from every ADC reading:
//! - a calibrated voltage, `gain * raw + offset`, which is what gets batched;
//! - a gauge pressure in kg/cm², from a 4-20 mA transmitter read across a
//!   shunt resistor, which is what gets smoothed for the display.

use serde::{Deserialize, Serialize};

const KG_CM2_PER_BAR: f64 = 1.0197;

/// Linear 4-20 mA transmitter model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentLoop {
    /// Shunt resistor in ohms.
    pub resistor_ohms: f64,
    pub current_min_ma: f64,
    pub current_max_ma: f64,
    /// Pressure at `current_min_ma`, in bar.
    pub pressure_min_bar: f64,
    /// Pressure at `current_max_ma`, in bar.
    pub pressure_max_bar: f64,
}

impl CurrentLoop {
    /// 4-20 mA mapped onto 0-100 bar.
    pub fn new(resistor_ohms: f64) -> Self {
        Self {
            resistor_ohms,
            current_min_ma: 4.0,
            current_max_ma: 20.0,
            pressure_min_bar: 0.0,
            pressure_max_bar: 100.0,
        }
    }

    /// Loop current in milliamps for a voltage across the shunt.
    pub fn current_ma(&self, volts: f64) -> f64 {
        volts / self.resistor_ohms * 1000.0
    }

    /// Gauge pressure in bar. Below 4 mA this goes negative; callers clamp
    /// for display.
    pub fn pressure_bar(&self, volts: f64) -> f64 {
        let span_ma = self.current_max_ma - self.current_min_ma;
        let span_bar = self.pressure_max_bar - self.pressure_min_bar;
        (self.current_ma(volts) - self.current_min_ma) * span_bar / span_ma + self.pressure_min_bar
    }

    pub fn pressure_kg_cm2(&self, volts: f64) -> f64 {
        self.pressure_bar(volts) * KG_CM2_PER_BAR
    }
}

/// Affine voltage calibration plus the current-loop pressure model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitConverter {
    pub gain: f64,
    pub offset: f64,
    pub current_loop: CurrentLoop,
}

impl UnitConverter {
    pub const DEFAULT_GAIN: f64 = 0.9295;
    pub const DEFAULT_OFFSET: f64 = 0.0093;

    pub fn new(gain: f64, offset: f64, resistor_ohms: f64) -> Self {
        Self {
            gain,
            offset,
            current_loop: CurrentLoop::new(resistor_ohms),
        }
    }

    /// Reference calibration for the given shunt.
    pub fn with_resistor(resistor_ohms: f64) -> Self {
        Self::new(Self::DEFAULT_GAIN, Self::DEFAULT_OFFSET, resistor_ohms)
    }

    /// Calibrated voltage.
    #[inline]
    pub fn corrected(&self, raw_volts: f64) -> f64 {
        self.gain * raw_volts + self.offset
    }

    /// Derived pressure in kg/cm², computed from the uncalibrated reading.
    #[inline]
    pub fn pressure(&self, raw_volts: f64) -> f64 {
        self.current_loop.pressure_kg_cm2(raw_volts)
    }

    /// Both quantities at once: `(corrected_volts, pressure_kg_cm2)`.
    pub fn convert(&self, raw_volts: f64) -> (f64, f64) {
        (self.corrected(raw_volts), self.pressure(raw_volts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn test_corrected_reference_constants() {
        let conv = UnitConverter::with_resistor(250.0);
        assert!((conv.corrected(0.0) - 0.0093).abs() < TOL);
        assert!((conv.corrected(1.0) - 0.9388).abs() < TOL);
    }

    #[test]
    fn test_pressure_endpoints() {
        // 250 ohm shunt: 1 V = 4 mA, 5 V = 20 mA.
        let conv = UnitConverter::with_resistor(250.0);
        assert!(conv.pressure(1.0).abs() < TOL);
        assert!((conv.pressure(5.0) - 101.97).abs() < 1e-9);
        assert!((conv.pressure(3.0) - 50.985).abs() < 1e-9);
    }

    #[test]
    fn test_pressure_below_live_zero_is_negative() {
        let conv = UnitConverter::with_resistor(250.0);
        assert!(conv.pressure(0.5) < 0.0);
    }

    #[test]
    fn test_current_ma() {
        let lp = CurrentLoop::new(165.0);
        assert!((lp.current_ma(1.65) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_convert_pairs() {
        let conv = UnitConverter::new(2.0, 1.0, 250.0);
        let (v, p) = conv.convert(1.0);
        assert!((v - 3.0).abs() < TOL);
        assert!(p.abs() < TOL);
    }
}
