//! Character display port and adapters.
//!
//! The display is a 20x4 character panel addressed by row and column.
//! Adapters:
//! - [`FrameFileDisplay`]: renders the panel to a text file (a virtual LCD)
//! - [`NullDisplay`]: discards everything
//!
//! [`DisplayUpdater`] drives a display from the shared smoothing window.

pub mod frame;
pub mod grid;
pub mod layout;
pub mod updater;

pub use frame::FrameFileDisplay;
pub use grid::CharGrid;
pub use layout::DisplayLayout;
pub use updater::{DisplayHandle, DisplayUpdater, RenderOutcome};

use std::path::PathBuf;

use thiserror::Error;

/// Panel geometry.
pub const DISPLAY_ROWS: usize = 4;
pub const DISPLAY_COLS: usize = 20;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("display unavailable at {path}: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("display write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("position ({row}, {col}) is outside the {rows}x{cols} panel")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

impl From<&DisplayError> for sampler_common::Error {
    fn from(err: &DisplayError) -> Self {
        sampler_common::Error::DisplayUnavailable(err.to_string())
    }
}

/// Text output addressed by row and column.
pub trait DisplayPort: Send {
    /// Write `text` starting at `(row, col)`. Text past the last column is
    /// dropped.
    fn write_at(&mut self, row: usize, col: usize, text: &str) -> Result<(), DisplayError>;

    /// Push buffered writes to the device.
    fn flush(&mut self) -> Result<(), DisplayError> {
        Ok(())
    }
}

impl<T: DisplayPort + ?Sized> DisplayPort for Box<T> {
    fn write_at(&mut self, row: usize, col: usize, text: &str) -> Result<(), DisplayError> {
        (**self).write_at(row, col, text)
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        (**self).flush()
    }
}

/// Display that accepts and discards all output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl DisplayPort for NullDisplay {
    fn write_at(&mut self, _row: usize, _col: usize, _text: &str) -> Result<(), DisplayError> {
        Ok(())
    }
}
