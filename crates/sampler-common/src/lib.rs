//! ADC sampler common types.
//!
//! This crate provides foundational types shared across the sampler crates:
//! - The unified top-level error with stable codes
//! - Category classification and recoverability hints

pub mod error;

pub use error::{format_error_human, Error, ErrorCategory, Result, StructuredError};
