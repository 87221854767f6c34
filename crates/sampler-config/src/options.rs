//! Enumerated configuration options.
//!
//! The ADS1115 exposes a fixed set of programmable gains and data rates;
//! anything else is rejected at startup rather than silently rounded.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// ADS1115 programmable gain amplifier setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdcGain {
    /// ±6.144 V full scale.
    TwoThirds,
    /// ±4.096 V full scale.
    #[default]
    One,
    /// ±2.048 V full scale.
    Two,
    /// ±1.024 V full scale.
    Four,
    /// ±0.512 V full scale.
    Eight,
    /// ±0.256 V full scale.
    Sixteen,
}

impl AdcGain {
    /// Full-scale input range in volts.
    pub fn full_scale_volts(self) -> f64 {
        match self {
            AdcGain::TwoThirds => 6.144,
            AdcGain::One => 4.096,
            AdcGain::Two => 2.048,
            AdcGain::Four => 1.024,
            AdcGain::Eight => 0.512,
            AdcGain::Sixteen => 0.256,
        }
    }

    /// Millivolts per LSB for a 16-bit signed conversion.
    ///
    /// This is the value the kernel exposes as `in_voltageN_scale`.
    pub fn scale_millivolts(self) -> f64 {
        self.full_scale_volts() * 1000.0 / 32768.0
    }
}

impl FromStr for AdcGain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "2/3" | "0.667" | "0.6667" => Ok(AdcGain::TwoThirds),
            "1" => Ok(AdcGain::One),
            "2" => Ok(AdcGain::Two),
            "4" => Ok(AdcGain::Four),
            "8" => Ok(AdcGain::Eight),
            "16" => Ok(AdcGain::Sixteen),
            other => Err(format!(
                "unknown ADC gain '{}', expected one of 2/3, 1, 2, 4, 8, 16",
                other
            )),
        }
    }
}

impl std::fmt::Display for AdcGain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdcGain::TwoThirds => write!(f, "2/3"),
            AdcGain::One => write!(f, "1"),
            AdcGain::Two => write!(f, "2"),
            AdcGain::Four => write!(f, "4"),
            AdcGain::Eight => write!(f, "8"),
            AdcGain::Sixteen => write!(f, "16"),
        }
    }
}

/// ADS1115 conversion rate in samples per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRate(u16);

impl DataRate {
    /// Rates supported by the converter.
    pub const SUPPORTED: [u16; 8] = [8, 16, 32, 64, 128, 250, 475, 860];

    pub fn new(samples_per_sec: u16) -> Result<Self, String> {
        if Self::SUPPORTED.contains(&samples_per_sec) {
            Ok(DataRate(samples_per_sec))
        } else {
            Err(format!(
                "unsupported data rate {} SPS, expected one of {:?}",
                samples_per_sec,
                Self::SUPPORTED
            ))
        }
    }

    pub fn samples_per_sec(self) -> u16 {
        self.0
    }
}

impl Default for DataRate {
    fn default() -> Self {
        DataRate(475)
    }
}

impl FromStr for DataRate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sps: u16 = s
            .trim()
            .parse()
            .map_err(|_| format!("data rate '{}' is not an integer", s))?;
        DataRate::new(sps)
    }
}

/// Which sensor adapter to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// Linux IIO channel backed by the ads1015 kernel driver.
    #[default]
    Iio,
    /// Synthetic 4-20 mA loop signal for bench runs.
    Simulated,
}

impl FromStr for SensorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "iio" | "ads1115" | "hardware" => Ok(SensorKind::Iio),
            "simulated" | "sim" | "fake" => Ok(SensorKind::Simulated),
            other => Err(format!("unknown sensor kind: {}", other)),
        }
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorKind::Iio => write!(f, "iio"),
            SensorKind::Simulated => write!(f, "simulated"),
        }
    }
}

/// Which display adapter to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayKind {
    /// 20x4 character frame mirrored to a file.
    #[default]
    Frame,
    /// No display attached.
    None,
}

impl FromStr for DisplayKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "frame" | "lcd" => Ok(DisplayKind::Frame),
            "none" | "off" | "headless" => Ok(DisplayKind::None),
            other => Err(format!("unknown display kind: {}", other)),
        }
    }
}

impl std::fmt::Display for DisplayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayKind::Frame => write!(f, "frame"),
            DisplayKind::None => write!(f, "none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_parse() {
        assert_eq!("2/3".parse::<AdcGain>().unwrap(), AdcGain::TwoThirds);
        assert_eq!("1".parse::<AdcGain>().unwrap(), AdcGain::One);
        assert_eq!(" 16 ".parse::<AdcGain>().unwrap(), AdcGain::Sixteen);
        assert!("3".parse::<AdcGain>().is_err());
    }

    #[test]
    fn test_gain_scale() {
        assert!((AdcGain::One.scale_millivolts() - 0.125).abs() < 1e-12);
        assert!((AdcGain::TwoThirds.scale_millivolts() - 0.1875).abs() < 1e-12);
    }

    #[test]
    fn test_data_rate() {
        assert_eq!("475".parse::<DataRate>().unwrap().samples_per_sec(), 475);
        assert!("500".parse::<DataRate>().is_err());
        assert!("fast".parse::<DataRate>().is_err());
        assert_eq!(DataRate::default().samples_per_sec(), 475);
    }

    #[test]
    fn test_kinds_parse() {
        assert_eq!("IIO".parse::<SensorKind>().unwrap(), SensorKind::Iio);
        assert_eq!("sim".parse::<SensorKind>().unwrap(), SensorKind::Simulated);
        assert_eq!("none".parse::<DisplayKind>().unwrap(), DisplayKind::None);
        assert!("hdmi".parse::<DisplayKind>().is_err());
    }
}
