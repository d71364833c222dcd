//! Typed field extraction from table rows.
//!
//! Rows reaching these helpers have already been through the adapter's fill
//! policy, so a missing or mistyped required field is an adapter contract
//! violation and surfaces as `MalformedRow`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::calculate::StatsError;
use crate::table::{Row, Value};

pub(crate) fn malformed(row: usize, reason: impl Into<String>) -> StatsError {
    StatsError::MalformedRow {
        row,
        reason: reason.into(),
    }
}

/// First non-null value among several column aliases.
pub(crate) fn first_of<'a>(row: &'a Row, columns: &[&str]) -> Option<&'a Value> {
    columns.iter().map(|c| row.get(c)).find(|v| !v.is_null())
}

/// Text field rendered from any non-null cell; numbers are formatted.
pub(crate) fn opt_text(row: &Row, columns: &[&str]) -> Option<String> {
    match first_of(row, columns) {
        None => None,
        Some(value) => {
            let text = value.to_string();
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
    }
}

pub(crate) fn required_text(row: &Row, columns: &[&str], idx: usize) -> Result<String, StatsError> {
    opt_text(row, columns).ok_or_else(|| malformed(idx, format!("missing '{}'", columns[0])))
}

/// Non-negative integer count. Missing is treated as 0.
pub(crate) fn count(row: &Row, columns: &[&str], idx: usize) -> Result<u32, StatsError> {
    match first_of(row, columns) {
        None => Ok(0),
        Some(Value::Int(i)) if *i >= 0 => Ok(*i as u32),
        Some(Value::Float(f)) if *f >= 0.0 && f.fract() == 0.0 => Ok(*f as u32),
        Some(other) => Err(malformed(
            idx,
            format!("'{}' is not a non-negative integer: {:?}", columns[0], other),
        )),
    }
}

/// Float field. Missing is treated as 0.0.
pub(crate) fn float(row: &Row, columns: &[&str], idx: usize) -> Result<f64, StatsError> {
    match first_of(row, columns) {
        None => Ok(0.0),
        Some(value) => value
            .as_f64()
            .ok_or_else(|| malformed(idx, format!("'{}' is not numeric: {:?}", columns[0], value))),
    }
}

/// Parse the timestamp formats seen in spreadsheet exports.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %H:%M:%S",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
        }
    }
    None
}

pub(crate) fn timestamp(row: &Row, columns: &[&str], idx: usize) -> Result<DateTime<Utc>, StatsError> {
    let raw = required_text(row, columns, idx)?;
    parse_timestamp(&raw).ok_or_else(|| malformed(idx, format!("unparseable date '{}'", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 2, 19, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-02T19:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-02 19:30:00"), Some(expected));
        assert_eq!(parse_timestamp("03/02/2024 19:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-02"),
            Some(Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_count_rejects_negative() {
        let row = Row::new().with("kills", -1i64);
        assert!(count(&row, &["kills"], 3).is_err());
        let row = Row::new();
        assert_eq!(count(&row, &["kills"], 0).unwrap(), 0);
    }

    #[test]
    fn test_first_of_aliases() {
        let row = Row::new().with("team1", "Alpha");
        assert_eq!(opt_text(&row, &["red_team", "team1"]), Some("Alpha".into()));
    }
}
