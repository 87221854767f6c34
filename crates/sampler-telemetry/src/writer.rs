//! CSV batch writer.
//!
//! Each batch goes to `<name>.csv.tmp` first and is renamed into place once
//! fully flushed, so consumers watching the output directory never see a
//! partial file.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use thiserror::Error;
use tracing::{debug, warn};

use crate::batch::Batch;
use crate::naming::BatchFileName;
use crate::schema::{format_row, CSV_HEADER};

/// Errors from batch writer operations.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl WriteError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        WriteError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Configuration for the batch writer.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Directory for finished batch files.
    pub output_dir: PathBuf,

    /// Filename prefix, e.g. `BFA1_`.
    pub prefix: String,

    /// Timezone for the filename timestamp.
    pub timezone: Tz,

    /// fsync the file before the rename.
    pub sync: bool,
}

impl WriterConfig {
    pub fn new(output_dir: PathBuf, prefix: impl Into<String>, timezone: Tz) -> Self {
        WriterConfig {
            output_dir,
            prefix: prefix.into(),
            timezone,
            sync: true,
        }
    }

    /// Skip fsync. Meant for tests on slow filesystems.
    pub fn without_sync(mut self) -> Self {
        self.sync = false;
        self
    }
}

/// Destination for sealed batches.
pub trait BatchStore: Send {
    /// Persist the batch and return the final path.
    fn store(&mut self, batch: &Batch) -> Result<PathBuf, WriteError>;

    /// Withdraw a stored batch whose event never went out. A path that is
    /// already gone is not an error.
    fn discard(&mut self, path: &Path) -> Result<(), WriteError>;
}

/// Writes sealed batches as CSV files.
#[derive(Debug, Clone)]
pub struct BatchWriter {
    config: WriterConfig,
}

impl BatchWriter {
    pub fn new(config: WriterConfig) -> Self {
        BatchWriter { config }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Final path a batch will be written to.
    pub fn output_path(&self, batch: &Batch) -> PathBuf {
        let name = BatchFileName::new(
            &self.config.prefix,
            batch.id(),
            batch.created_at(),
            self.config.timezone,
        );
        self.config.output_dir.join(name.to_string())
    }

    /// Write the batch and return its path.
    pub fn write(&self, batch: &Batch) -> Result<PathBuf, WriteError> {
        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| WriteError::io(&self.config.output_dir, e))?;

        let output_path = self.output_path(batch);
        let file_name = output_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| WriteError::InvalidPath(output_path.display().to_string()))?;
        let temp_path = output_path.with_file_name(format!("{}.tmp", file_name));

        if let Err(e) = self.write_rows(&temp_path, batch) {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %temp_path.display(), error = %cleanup, "failed to remove partial batch file");
                }
            }
            return Err(e);
        }

        atomic_rename(&temp_path, &output_path)?;
        debug!(
            batch_id = batch.id(),
            rows = batch.len(),
            path = %output_path.display(),
            "batch file written"
        );
        Ok(output_path)
    }

    fn write_rows(&self, path: &Path, batch: &Batch) -> Result<(), WriteError> {
        let file = File::create(path).map_err(|e| WriteError::io(path, e))?;
        let mut out = BufWriter::new(file);
        writeln!(out, "{}", CSV_HEADER).map_err(|e| WriteError::io(path, e))?;
        for reading in batch.readings() {
            writeln!(out, "{}", format_row(&reading.timestamp, reading.corrected))
                .map_err(|e| WriteError::io(path, e))?;
        }
        let file = out
            .into_inner()
            .map_err(|e| WriteError::io(path, e.into_error()))?;
        if self.config.sync {
            file.sync_all().map_err(|e| WriteError::io(path, e))?;
        }
        Ok(())
    }
}

impl BatchStore for BatchWriter {
    fn store(&mut self, batch: &Batch) -> Result<PathBuf, WriteError> {
        self.write(batch)
    }

    fn discard(&mut self, path: &Path) -> Result<(), WriteError> {
        match fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "batch file withdrawn");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WriteError::io(path, e)),
        }
    }
}

/// Helper to rename temp file to final path atomically.
pub fn atomic_rename(temp_path: &Path, final_path: &Path) -> Result<(), WriteError> {
    fs::rename(temp_path, final_path).map_err(|e| WriteError::io(final_path, e))
}
