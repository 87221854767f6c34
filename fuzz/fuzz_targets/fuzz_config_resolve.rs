//! Fuzz target for environment resolution and validation.
//!
//! Every required variable is present (possibly garbage) so the fuzzer
//! reaches the parsing and semantic checks instead of stopping at the first
//! missing field.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sampler_config::resolve_config;

#[derive(Debug, Arbitrary)]
struct FuzzEnv {
    batch_size: String,
    sampling_rate: String,
    timezone: String,
    resistor: String,
    queue_port: String,
    prefix: Option<String>,
    gain: Option<String>,
    data_rate: Option<String>,
    channel: Option<String>,
    refresh: Option<String>,
    window: Option<String>,
}

fuzz_target!(|env: FuzzEnv| {
    let _ = resolve_config(|key| match key {
        "BATCH_SIZE" => Some(env.batch_size.clone()),
        "SAMPLING_RATE" => Some(env.sampling_rate.clone()),
        "TIMEZONE" => Some(env.timezone.clone()),
        "RESISTOR_VALUE" => Some(env.resistor.clone()),
        "QUEUE_PORT" => Some(env.queue_port.clone()),
        "FILE_DIRECTORY_ADC_BATCHES" => Some("/tmp/out".to_string()),
        "FILE_DIRECTORY_ADC_BATCHES_BACKUP" => Some("/tmp/backup".to_string()),
        "ADC_BATCH_CREATED_EVENT" => Some("EVENT".to_string()),
        "QUEUE_HOST" => Some("localhost".to_string()),
        "AUTH_KEY" => Some("key".to_string()),
        "BATCH_FILE_PREFIX" => env.prefix.clone(),
        "ADC_GAIN" => env.gain.clone(),
        "ADC_DATA_RATE" => env.data_rate.clone(),
        "ADC_CHANNEL" => env.channel.clone(),
        "DISPLAY_REFRESH_SECS" => env.refresh.clone(),
        "SMOOTHING_WINDOW" => env.window.clone(),
        _ => None,
    });
});
