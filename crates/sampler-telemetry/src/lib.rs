//! ADC sampler batch storage.
//!
//! This crate provides:
//! - The reading and batch model, with sealing enforced at the type level
//! - Batch filename formatting and parsing
//! - Atomic CSV batch writer
//! - Batch id recovery from existing files
//! - A reader for the CSV batch format

pub mod batch;
pub mod naming;
pub mod reader;
pub mod resolver;
pub mod schema;
pub mod writer;

pub use batch::{Batch, BatchError, PendingBatch, Reading};
pub use naming::{BatchFileName, BatchNamePattern};
pub use reader::{parse_batch_csv, read_batch_file, BatchRow, ReadError};
pub use resolver::{BatchNumberResolver, ResolveError};
pub use schema::CSV_HEADER;
pub use writer::{atomic_rename, BatchStore, BatchWriter, WriteError, WriterConfig};

/// First batch id handed out on an empty system.
pub const FIRST_BATCH_ID: u64 = 1;
