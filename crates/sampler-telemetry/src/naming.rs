//! Batch file naming.
//!
//! Layout: `<prefix>Batch<id>_<YYYY-MM-DD>_<HH-MM-SS>.csv`, where the
//! timestamp is the batch creation time in the configured timezone.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use regex::Regex;

/// strftime layout of the filename timestamp.
pub const STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Extension of finished batch files.
pub const BATCH_EXTENSION: &str = "csv";

/// Parsed components of a batch filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFileName {
    pub prefix: String,
    pub id: u64,
    /// Local creation time as it appears in the name.
    pub stamp: NaiveDateTime,
}

impl BatchFileName {
    /// Name for a batch created at `created_at`, rendered in `tz`.
    pub fn new(prefix: &str, id: u64, created_at: DateTime<Utc>, tz: Tz) -> Self {
        BatchFileName {
            prefix: prefix.to_string(),
            id,
            stamp: created_at.with_timezone(&tz).naive_local(),
        }
    }
}

impl fmt::Display for BatchFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}Batch{}_{}.{}",
            self.prefix,
            self.id,
            self.stamp.format(STAMP_FORMAT),
            BATCH_EXTENSION
        )
    }
}

/// Matcher for batch filenames carrying one specific prefix.
#[derive(Debug, Clone)]
pub struct BatchNamePattern {
    prefix: String,
    regex: Regex,
}

impl BatchNamePattern {
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!(
            r"^{}Batch(\d+)_(\d{{4}}-\d{{2}}-\d{{2}}_\d{{2}}-\d{{2}}-\d{{2}})\.csv$",
            regex::escape(prefix)
        ))?;
        Ok(BatchNamePattern {
            prefix: prefix.to_string(),
            regex,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Parse a bare filename. Returns `None` for anything that is not a
    /// batch file with this prefix, including ids that do not fit in `u64`
    /// and impossible calendar dates.
    pub fn parse(&self, file_name: &str) -> Option<BatchFileName> {
        let caps = self.regex.captures(file_name)?;
        let id = caps.get(1)?.as_str().parse::<u64>().ok()?;
        let stamp = NaiveDateTime::parse_from_str(caps.get(2)?.as_str(), STAMP_FORMAT).ok()?;
        Some(BatchFileName {
            prefix: self.prefix.clone(),
            id,
            stamp,
        })
    }

    /// Just the id, for directory scans.
    pub fn batch_id(&self, file_name: &str) -> Option<u64> {
        self.parse(file_name).map(|name| name.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_uses_timezone() {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 23, 45, 7).unwrap();
        let name = BatchFileName::new("BFA1_", 42, created, chrono_tz::Asia::Kolkata);
        assert_eq!(name.to_string(), "BFA1_Batch42_2024-03-02_05-15-07.csv");
    }

    #[test]
    fn test_parse_matches_formatted_name() {
        let pattern = BatchNamePattern::new("BFA1_").unwrap();
        let parsed = pattern.parse("BFA1_Batch7_2024-01-31_08-00-59.csv").unwrap();
        assert_eq!(parsed.id, 7);
        assert_eq!(parsed.prefix, "BFA1_");
        assert_eq!(parsed.to_string(), "BFA1_Batch7_2024-01-31_08-00-59.csv");
    }

    #[test]
    fn test_parse_rejects_other_names() {
        let pattern = BatchNamePattern::new("BFA1_").unwrap();
        for name in [
            "BFA2_Batch7_2024-01-31_08-00-59.csv",
            "BFA1_Batch7_2024-01-31_08-00-59.csv.tmp",
            "BFA1_Batch_2024-01-31_08-00-59.csv",
            "BFA1_Batch7_2024-13-31_08-00-59.csv",
            "xBFA1_Batch7_2024-01-31_08-00-59.csv",
            "BFA1_Batch99999999999999999999999_2024-01-31_08-00-59.csv",
            "notes.txt",
        ] {
            assert!(pattern.parse(name).is_none(), "{name} should not parse");
        }
    }

    #[test]
    fn test_prefix_is_literal() {
        let pattern = BatchNamePattern::new("A.B_").unwrap();
        assert_eq!(pattern.batch_id("A.B_Batch3_2024-01-01_00-00-00.csv"), Some(3));
        assert_eq!(pattern.batch_id("AxB_Batch3_2024-01-01_00-00-00.csv"), None);
    }
}
