//! Virtual LCD backed by a frame file.
//!
//! Writes update an in-memory grid; [`DisplayPort::flush`] replaces the
//! frame file atomically, so `watch cat display.txt` always shows a whole
//! frame.

use std::fs;
use std::path::{Path, PathBuf};

use super::{CharGrid, DisplayError, DisplayPort};

#[derive(Debug)]
pub struct FrameFileDisplay {
    path: PathBuf,
    temp_path: PathBuf,
    grid: CharGrid,
}

impl FrameFileDisplay {
    /// Create the frame file with a blank panel.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DisplayError> {
        let path = path.into();
        let unavailable = |source| DisplayError::Unavailable {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(unavailable)?;
        }
        let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
        temp_name.push(".tmp");
        let temp_path = path.with_file_name(temp_name);

        let mut display = FrameFileDisplay {
            path: path.clone(),
            temp_path,
            grid: CharGrid::default(),
        };
        display.write_frame().map_err(unavailable)?;
        Ok(display)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn grid(&self) -> &CharGrid {
        &self.grid
    }

    fn write_frame(&mut self) -> std::io::Result<()> {
        fs::write(&self.temp_path, self.grid.render())?;
        fs::rename(&self.temp_path, &self.path)
    }
}

impl DisplayPort for FrameFileDisplay {
    fn write_at(&mut self, row: usize, col: usize, text: &str) -> Result<(), DisplayError> {
        self.grid.write_at(row, col, text)
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        self.write_frame()?;
        Ok(())
    }
}
