//! ADC Sampler Core Library
//!
//! Runtime pieces of the sampler:
//! - Sensor, display and event-sink ports with their Linux adapters
//! - The sampling loop: paced acquisition, batching, write, publish
//! - The display updater thread
//! - Logging, shutdown handling and exit codes
//!
//! The binary entry point is in `main.rs`.

pub mod display;
pub mod events;
pub mod exit_codes;
pub mod logging;
pub mod sampler;
pub mod sensor;
pub mod shutdown;
pub mod startup;
