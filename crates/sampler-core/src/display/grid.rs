//! In-memory character grid.

use super::{DisplayError, DISPLAY_COLS, DISPLAY_ROWS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharGrid {
    rows: usize,
    cols: usize,
    cells: Vec<char>,
}

impl CharGrid {
    pub fn new(rows: usize, cols: usize) -> Self {
        CharGrid {
            rows,
            cols,
            cells: vec![' '; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Overwrite cells starting at `(row, col)`, clipping at the row end.
    pub fn write_at(&mut self, row: usize, col: usize, text: &str) -> Result<(), DisplayError> {
        if row >= self.rows || col >= self.cols {
            return Err(DisplayError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        let start = row * self.cols + col;
        let room = self.cols - col;
        for (cell, ch) in self.cells[start..start + room].iter_mut().zip(text.chars()) {
            *cell = ch;
        }
        Ok(())
    }

    /// One row as a string, trailing spaces included.
    pub fn row(&self, row: usize) -> Option<String> {
        if row >= self.rows {
            return None;
        }
        let start = row * self.cols;
        Some(self.cells[start..start + self.cols].iter().collect())
    }

    /// Every row, newline terminated.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.rows * (self.cols + 1));
        for row in self.cells.chunks(self.cols) {
            out.extend(row.iter());
            out.push('\n');
        }
        out
    }

    pub fn clear(&mut self) {
        self.cells.fill(' ');
    }
}

impl Default for CharGrid {
    fn default() -> Self {
        CharGrid::new(DISPLAY_ROWS, DISPLAY_COLS)
    }
}
