//! Reader for CSV batch files.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{parse_timestamp, CSV_HEADER};

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing header")]
    MissingHeader,

    #[error("Unexpected header: {0:?}")]
    BadHeader(String),

    #[error("Line {line}: {message}")]
    Malformed { line: usize, message: String },
}

/// One data row of a batch file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchRow {
    pub timestamp: DateTime<Utc>,
    pub voltage: f64,
}

/// Read and parse a batch file.
pub fn read_batch_file(path: &Path) -> Result<Vec<BatchRow>, ReadError> {
    let contents = fs::read_to_string(path)?;
    parse_batch_csv(&contents)
}

/// Parse batch CSV text. Accepts LF or CRLF line endings; a trailing blank
/// line is allowed, blank lines elsewhere are not.
pub fn parse_batch_csv(contents: &str) -> Result<Vec<BatchRow>, ReadError> {
    let body = contents.strip_suffix('\n').unwrap_or(contents);
    let mut lines = body.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));

    match lines.next() {
        None | Some("") => return Err(ReadError::MissingHeader),
        Some(header) if header.trim_start_matches('\u{feff}') == CSV_HEADER => {}
        Some(header) => return Err(ReadError::BadHeader(header.to_string())),
    }

    let mut rows = Vec::new();
    for (idx, line) in lines.enumerate() {
        let line_no = idx + 2;
        let malformed = |message: String| ReadError::Malformed {
            line: line_no,
            message,
        };

        let (ts, voltage) = line
            .split_once(',')
            .ok_or_else(|| malformed("expected two fields".to_string()))?;
        if voltage.contains(',') {
            return Err(malformed("expected two fields".to_string()));
        }
        let timestamp = parse_timestamp(ts)
            .ok_or_else(|| malformed(format!("bad timestamp {:?}", ts)))?;
        let voltage: f64 = voltage
            .parse()
            .map_err(|_| malformed(format!("bad voltage {:?}", voltage)))?;
        rows.push(BatchRow { timestamp, voltage });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crlf_and_trailing_newline() {
        let rows = parse_batch_csv("Timestamp,Voltage\r\n10.000001,0.25\r\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].voltage, 0.25);
        assert_eq!(rows[0].timestamp.timestamp_micros(), 10_000_001);
    }

    #[test]
    fn test_header_only_is_empty_batch() {
        assert!(parse_batch_csv("Timestamp,Voltage\n").unwrap().is_empty());
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse_batch_csv(""), Err(ReadError::MissingHeader)));
        assert!(matches!(
            parse_batch_csv("time,volts\n"),
            Err(ReadError::BadHeader(_))
        ));
        assert!(matches!(
            parse_batch_csv("Timestamp,Voltage\n1.0,abc\n"),
            Err(ReadError::Malformed { line: 2, .. })
        ));
        assert!(matches!(
            parse_batch_csv("Timestamp,Voltage\n1.0,2.0\n\n"),
            Err(ReadError::Malformed { line: 3, .. })
        ));
        assert!(matches!(
            parse_batch_csv("Timestamp,Voltage\n1.0,2.0,3.0\n"),
            Err(ReadError::Malformed { line: 2, .. })
        ));
    }
}
