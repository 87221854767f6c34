//! Fuzz target for batch filename parsing.
//!
//! Any name that parses must format to a name that parses to the same
//! components, since the resolver relies on the pattern and the writer
//! agreeing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sampler_telemetry::BatchNamePattern;

fuzz_target!(|data: (&str, &str)| {
    let (prefix, name) = data;
    let Ok(pattern) = BatchNamePattern::new(prefix) else {
        return;
    };
    if let Some(parsed) = pattern.parse(name) {
        assert_eq!(pattern.batch_id(name), Some(parsed.id));
        assert_eq!(pattern.parse(&parsed.to_string()), Some(parsed));
    }
});
