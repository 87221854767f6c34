//! Fuzz target for the batch CSV reader.
//!
//! Tests that `parse_batch_csv` handles arbitrary input without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sampler_telemetry::parse_batch_csv;

fuzz_target!(|data: &str| {
    let _ = parse_batch_csv(data);
});
