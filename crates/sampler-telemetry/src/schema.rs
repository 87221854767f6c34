//! CSV batch file schema.
//!
//! UTF-8, comma separated, one header line then one row per reading:
//! `Timestamp` is epoch seconds with exactly six fractional digits and
//! `Voltage` is the shortest decimal that parses back to the same `f64`.

use chrono::{DateTime, Utc};

pub const CSV_HEADER: &str = "Timestamp,Voltage";

const MICROS_PER_SEC: i64 = 1_000_000;

/// Render a timestamp as `<secs>.<micros>`. Sub-microsecond precision is dropped.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    let micros = ts.timestamp_micros();
    let sign = if micros < 0 { "-" } else { "" };
    let abs = micros.unsigned_abs();
    format!(
        "{}{}.{:06}",
        sign,
        abs / MICROS_PER_SEC as u64,
        abs % MICROS_PER_SEC as u64
    )
}

/// Inverse of [`format_timestamp`]. Accepts up to six fractional digits.
pub fn parse_timestamp(field: &str) -> Option<DateTime<Utc>> {
    let (negative, body) = match field.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, field),
    };
    let (secs, frac) = body.split_once('.').unwrap_or((body, ""));
    if secs.is_empty() || frac.len() > 6 || !secs.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let secs: i64 = secs.parse().ok()?;
    let frac_micros: i64 = if frac.is_empty() {
        0
    } else {
        format!("{:0<6}", frac).parse().ok()?
    };
    let magnitude = secs.checked_mul(MICROS_PER_SEC)?.checked_add(frac_micros)?;
    let micros = if negative { -magnitude } else { magnitude };
    DateTime::from_timestamp_micros(micros)
}

pub fn format_row(ts: &DateTime<Utc>, voltage: f64) -> String {
    format!("{},{}", format_timestamp(ts), voltage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_timestamp_six_digits() {
        let ts = Utc.timestamp_opt(1_700_000_000, 5_000).unwrap();
        assert_eq!(format_timestamp(&ts), "1700000000.000005");
    }

    #[test]
    fn test_negative_timestamp() {
        let ts = DateTime::from_timestamp_micros(-1_500_000).unwrap();
        assert_eq!(format_timestamp(&ts), "-1.500000");
        assert_eq!(parse_timestamp("-1.500000"), Some(ts));
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let ts = Utc.timestamp_opt(12, 500_000_000).unwrap();
        assert_eq!(parse_timestamp("12.5"), Some(ts));
        assert_eq!(parse_timestamp("12.500000"), Some(ts));
        assert_eq!(parse_timestamp("12"), Utc.timestamp_opt(12, 0).single());
        assert_eq!(parse_timestamp("12.1234567"), None);
        assert_eq!(parse_timestamp("1e3"), None);
        assert_eq!(parse_timestamp(".5"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_format_row_voltage_shortest() {
        let ts = Utc.timestamp_opt(1, 0).unwrap();
        assert_eq!(format_row(&ts, 0.1), "1.000000,0.1");
        assert_eq!(format_row(&ts, 2.0), "1.000000,2");
    }
}
