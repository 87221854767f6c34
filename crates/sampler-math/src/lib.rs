//! ADC sampler math utilities.

pub mod convert;
pub mod window;

pub use convert::{CurrentLoop, UnitConverter};
pub use window::RollingAverage;
