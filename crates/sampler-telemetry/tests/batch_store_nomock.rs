//! No-mock batch storage tests.
//!
//! Covers:
//! - Batch id recovery over real directories
//! - Write then read back through the CSV format
//! - Output naming against the recovery pattern

use chrono::{DateTime, TimeZone, Utc};
use sampler_telemetry::{
    read_batch_file, Batch, BatchNumberResolver, BatchStore, BatchWriter, PendingBatch, Reading,
    WriterConfig,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

fn touch(dir: &Path, name: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), b"Timestamp,Voltage\n").unwrap();
}

fn batch_with(id: u64, readings: Vec<Reading>, created_at: DateTime<Utc>) -> Batch {
    let mut pending = PendingBatch::new(id, readings.len()).unwrap();
    for r in readings {
        pending.push(r).unwrap();
    }
    pending.seal(created_at).unwrap()
}

// ============================================================================
// Id recovery
// ============================================================================

#[test]
fn empty_directory_starts_at_one() {
    let temp_dir = TempDir::new().unwrap();
    let resolver = BatchNumberResolver::new("BFA1_").unwrap();
    assert_eq!(resolver.next_batch_id(temp_dir.path()).unwrap(), 1);
}

#[test]
fn resumes_after_highest_id() {
    let temp_dir = TempDir::new().unwrap();
    for id in [3, 7, 2] {
        touch(
            temp_dir.path(),
            &format!("BFA1_Batch{id}_2024-02-0{id}_10-00-00.csv"),
        );
    }
    let resolver = BatchNumberResolver::new("BFA1_").unwrap();
    assert_eq!(resolver.next_batch_id(temp_dir.path()).unwrap(), 8);
}

#[test]
fn unrelated_entries_are_ignored() {
    let temp_dir = TempDir::new().unwrap();
    touch(temp_dir.path(), "BFA1_Batch4_2024-02-01_10-00-00.csv");
    touch(temp_dir.path(), "BFA1_Batch900_2024-02-01_10-00-00.csv.tmp");
    touch(temp_dir.path(), "BFA2_Batch50_2024-02-01_10-00-00.csv");
    touch(temp_dir.path(), "README.md");
    fs::create_dir(temp_dir.path().join("BFA1_Batch77_sub")).unwrap();

    let resolver = BatchNumberResolver::new("BFA1_").unwrap();
    assert_eq!(resolver.next_batch_id(temp_dir.path()).unwrap(), 5);
}

#[test]
fn max_is_taken_across_directories() {
    let temp_dir = TempDir::new().unwrap();
    let backup = temp_dir.path().join("backup");
    let output = temp_dir.path().join("output");
    touch(&backup, "BFA1_Batch10_2024-02-01_10-00-00.csv");
    touch(&output, "BFA1_Batch11_2024-02-01_10-00-05.csv");

    let resolver = BatchNumberResolver::new("BFA1_").unwrap();
    assert_eq!(resolver.next_batch_id(&backup).unwrap(), 11);
    assert_eq!(resolver.next_batch_id_across(&[&backup, &output]).unwrap(), 12);
    assert_eq!(
        resolver
            .next_batch_id_across(&[backup.as_path(), temp_dir.path().join("none").as_path()])
            .unwrap(),
        11
    );
}

// ============================================================================
// Write / read
// ============================================================================

#[test]
fn written_file_reads_back_exactly() {
    let temp_dir = TempDir::new().unwrap();
    let readings: Vec<Reading> = [0.1, 1.0 / 3.0, 2.718281828459045, -0.0093, 4.0]
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let ts = Utc
                .timestamp_opt(1_717_000_000 + i as i64, 123_456_789 + i as u32)
                .unwrap();
            Reading::new(ts, *v, *v)
        })
        .collect();
    let batch = batch_with(5, readings.clone(), Utc::now());

    let mut writer = BatchWriter::new(
        WriterConfig::new(temp_dir.path().to_path_buf(), "BFA1_", chrono_tz::Asia::Kolkata)
            .without_sync(),
    );
    let path = writer.store(&batch).unwrap();

    let rows = read_batch_file(&path).unwrap();
    assert_eq!(rows.len(), readings.len());
    for (row, reading) in rows.iter().zip(&readings) {
        assert_eq!(row.timestamp, reading.timestamp);
        assert_eq!(row.voltage.to_bits(), reading.corrected.to_bits());
    }
}

#[test]
fn written_name_is_recovered_by_resolver() {
    let temp_dir = TempDir::new().unwrap();
    let ts = Utc.with_ymd_and_hms(2024, 12, 31, 20, 0, 0).unwrap();
    let batch = batch_with(41, vec![Reading::new(ts, 1.0, 1.0)], ts);

    let writer = BatchWriter::new(
        WriterConfig::new(temp_dir.path().to_path_buf(), "BFA1_", chrono_tz::Asia::Kolkata)
            .without_sync(),
    );
    let path = writer.write(&batch).unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "BFA1_Batch41_2025-01-01_01-30-00.csv"
    );

    let resolver = BatchNumberResolver::new("BFA1_").unwrap();
    let parsed = resolver
        .pattern()
        .parse(path.file_name().unwrap().to_str().unwrap())
        .unwrap();
    assert_eq!(parsed.id, 41);
    assert_eq!(resolver.next_batch_id(temp_dir.path()).unwrap(), 42);
}
