//! Panel layout: static labels plus one numeric field.

use super::{DisplayError, DisplayPort, DISPLAY_COLS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub row: usize,
    pub col: usize,
    pub text: String,
}

impl Label {
    pub fn new(row: usize, col: usize, text: impl Into<String>) -> Self {
        Label {
            row,
            col,
            text: text.into(),
        }
    }
}

/// Where the labels and the smoothed value go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLayout {
    pub labels: Vec<Label>,
    pub value_row: usize,
    /// First column cleared before each value write.
    pub blank_col: usize,
    /// Number of columns cleared before each value write.
    pub blank_width: usize,
    pub value_col: usize,
}

impl Default for DisplayLayout {
    fn default() -> Self {
        DisplayLayout {
            labels: vec![
                Label::new(0, 8, "ILDS"),
                Label::new(1, 0, "BharatFlow Analytics"),
                Label::new(2, 0, "P(g) kg/cm2:"),
                Label::new(3, 0, "Status:-"),
            ],
            value_row: 2,
            blank_col: 12,
            // Through the end of the row, so a shorter value leaves no
            // stale digits behind.
            blank_width: DISPLAY_COLS - 12,
            value_col: 13,
        }
    }
}

impl DisplayLayout {
    /// Draw the labels once at startup.
    pub fn draw_static<D: DisplayPort + ?Sized>(&self, display: &mut D) -> Result<(), DisplayError> {
        for label in &self.labels {
            display.write_at(label.row, label.col, &label.text)?;
        }
        display.flush()
    }

    /// Clear the value field and write `value`. Returns the text written.
    pub fn render_value<D: DisplayPort + ?Sized>(
        &self,
        display: &mut D,
        value: f64,
    ) -> Result<String, DisplayError> {
        let text = format_value(value);
        display.write_at(self.value_row, self.blank_col, &" ".repeat(self.blank_width))?;
        display.write_at(self.value_row, self.value_col, &text)?;
        display.flush()?;
        Ok(text)
    }
}

/// Two decimals, negatives (and NaN) shown as zero.
pub fn format_value(value: f64) -> String {
    let shown = if value > 0.0 { value } else { 0.0 };
    format!("{:.2}", shown)
}
