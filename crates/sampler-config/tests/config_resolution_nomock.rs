//! No-mock configuration resolution tests.
//!
//! Covers:
//! - Resolution from the real process environment
//! - Snapshot contents (defaults recorded, secrets excluded)
//! - Field-level errors for the variables operators most often get wrong

use sampler_config::resolve::vars;
use sampler_config::{resolve_config, ConfigSnapshot, SamplerConfig, ValidationError};
use std::collections::HashMap;
use std::env;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

struct EnvGuard {
    keys: Vec<String>,
    saved: Vec<Option<String>>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        let mut saved = Vec::with_capacity(keys.len());
        for key in keys {
            saved.push(env::var(key).ok());
        }
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.keys.iter().zip(self.saved.iter()) {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }
}

fn required_env(dir: &TempDir) -> Vec<(&'static str, String)> {
    vec![
        (vars::BATCH_SIZE, "5".to_string()),
        (vars::SAMPLING_RATE, "0.1".to_string()),
        (vars::TIMEZONE, "Asia/Kolkata".to_string()),
        (
            vars::OUTPUT_DIR,
            dir.path().join("out").display().to_string(),
        ),
        (
            vars::BACKUP_DIR,
            dir.path().join("backup").display().to_string(),
        ),
        (vars::RESISTOR_VALUE, "250".to_string()),
        (vars::EVENT_TYPE, "adc_batch_created".to_string()),
        (vars::QUEUE_HOST, "localhost".to_string()),
        (vars::QUEUE_PORT, "50000".to_string()),
        (vars::AUTH_KEY, "hunter2".to_string()),
    ]
}

#[test]
fn from_env_reads_process_environment() {
    let _lock = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap();
    let dir = TempDir::new().unwrap();
    let pairs = required_env(&dir);
    let keys: Vec<&str> = pairs
        .iter()
        .map(|(k, _)| *k)
        .chain([vars::ADC_GAIN, vars::BATCH_FILE_PREFIX])
        .collect();
    let _guard = EnvGuard::new(&keys);

    for (key, value) in &pairs {
        env::set_var(key, value);
    }
    env::set_var(vars::ADC_GAIN, "2/3");
    env::set_var(vars::BATCH_FILE_PREFIX, "BFA7_");

    let config = SamplerConfig::from_env().expect("config resolves");
    assert_eq!(config.batch.size, 5);
    assert_eq!(config.sampling.period, Duration::from_millis(100));
    assert_eq!(config.batch.prefix, "BFA7_");
    assert_eq!(config.device_id().as_deref(), Some("BFA7"));
    assert_eq!(config.sensor.gain.to_string(), "2/3");
}

#[test]
fn snapshot_lists_defaults_and_hides_secret() {
    let dir = TempDir::new().unwrap();
    let env: HashMap<&str, String> = required_env(&dir).into_iter().collect();
    let config = resolve_config(|key| env.get(key).cloned()).unwrap();

    let snapshot = ConfigSnapshot::from(&config);
    assert_eq!(snapshot.batch_size, 5);
    assert_eq!(snapshot.timezone, "Asia/Kolkata");
    assert_eq!(snapshot.queue_endpoint, "localhost:50000");
    assert!(snapshot.defaulted.contains(&"ADC_GAIN".to_string()));
    assert!(snapshot.defaulted.contains(&"RETRY_DELAY_SECS".to_string()));
    assert!(!snapshot.defaulted.contains(&"BATCH_SIZE".to_string()));

    let json = snapshot.to_json();
    assert!(!json.contains("hunter2"));
    assert!(json.contains(r#""device_id":"BFA1""#));
}

#[test]
fn invalid_port_and_prefix_are_reported_by_name() {
    let dir = TempDir::new().unwrap();

    let mut env: HashMap<&str, String> = required_env(&dir).into_iter().collect();
    env.insert(vars::QUEUE_PORT, "70000".to_string());
    let err = resolve_config(|key| env.get(key).cloned()).unwrap_err();
    assert!(matches!(err, ValidationError::ParseError { ref field, .. } if field == "QUEUE_PORT"));

    let mut env: HashMap<&str, String> = required_env(&dir).into_iter().collect();
    env.insert(vars::BATCH_FILE_PREFIX, "a/b".to_string());
    let err = resolve_config(|key| env.get(key).cloned()).unwrap_err();
    assert_eq!(err.field(), Some("BATCH_FILE_PREFIX"));
}

#[test]
fn explicit_display_frame_path_wins_over_log_directory() {
    let dir = TempDir::new().unwrap();
    let mut env: HashMap<&str, String> = required_env(&dir).into_iter().collect();
    env.insert(vars::LOG_DIRECTORY, dir.path().display().to_string());
    let config = resolve_config(|key| env.get(key).cloned()).unwrap();
    assert_eq!(config.display.frame_path, dir.path().join("display.txt"));

    let explicit = dir.path().join("lcd.txt");
    env.insert(vars::DISPLAY_FRAME_PATH, explicit.display().to_string());
    let config = resolve_config(|key| env.get(key).cloned()).unwrap();
    assert_eq!(config.display.frame_path, explicit);
}
