//! Batch id recovery.
//!
//! On startup the sampler scans the directories it writes to and resumes
//! numbering after the highest id found there. Names that do not match the
//! batch pattern are ignored.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::naming::BatchNamePattern;
use crate::FIRST_BATCH_ID;

/// Errors from batch id recovery.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Cannot scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Batch id space exhausted (found id {0})")]
    Exhausted(u64),

    #[error("Invalid batch prefix: {0}")]
    Pattern(#[from] regex::Error),
}

/// Derives the next batch id from existing files.
#[derive(Debug, Clone)]
pub struct BatchNumberResolver {
    pattern: BatchNamePattern,
}

impl BatchNumberResolver {
    pub fn new(prefix: &str) -> Result<Self, ResolveError> {
        Ok(BatchNumberResolver {
            pattern: BatchNamePattern::new(prefix)?,
        })
    }

    pub fn pattern(&self) -> &BatchNamePattern {
        &self.pattern
    }

    /// Highest batch id in `dir`. A missing directory counts as empty.
    pub fn max_batch_id(&self, dir: &Path) -> Result<Option<u64>, ResolveError> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) if dir.is_file() => {
                debug!(path = %dir.display(), error = %e, "batch directory is a file");
                return Err(ResolveError::NotADirectory(dir.to_path_buf()));
            }
            Err(source) => {
                return Err(ResolveError::Scan {
                    path: dir.to_path_buf(),
                    source,
                })
            }
        };

        let mut max_id = None;
        let mut matched = 0usize;
        for entry in entries {
            let entry = entry.map_err(|source| ResolveError::Scan {
                path: dir.to_path_buf(),
                source,
            })?;
            let name = entry.file_name();
            let Some(id) = name.to_str().and_then(|n| self.pattern.batch_id(n)) else {
                continue;
            };
            matched += 1;
            max_id = max_id.max(Some(id));
        }

        debug!(
            path = %dir.display(),
            matched,
            max_id = ?max_id,
            "scanned batch directory"
        );
        Ok(max_id)
    }

    /// `max + 1` over `dir`, or [`FIRST_BATCH_ID`] when no batch file exists.
    pub fn next_batch_id(&self, dir: &Path) -> Result<u64, ResolveError> {
        self.next_batch_id_across(&[dir])
    }

    /// `max + 1` over several directories.
    pub fn next_batch_id_across<P: AsRef<Path>>(&self, dirs: &[P]) -> Result<u64, ResolveError> {
        let mut max_id = None;
        for dir in dirs {
            max_id = max_id.max(self.max_batch_id(dir.as_ref())?);
        }
        match max_id {
            None => Ok(FIRST_BATCH_ID),
            Some(id) => id.checked_add(1).ok_or(ResolveError::Exhausted(id)),
        }
    }
}
