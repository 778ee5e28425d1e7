// =============================================================================
// dates.rs — COURIER TIMESTAMPS, IN ALL THEIR GLORIOUS VARIETY
// =============================================================================
//
// Every courier has its own opinion on how to write a date. We try a short
// list of formats in order and give up gracefully. A row whose date cannot
// be read is dropped by the caller instead of being stamped with "now".
//
// Naive timestamps are read as UTC. Proper locale and timezone handling is
// not something this crate attempts.
// =============================================================================

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d.%m.%Y, %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Parse a courier timestamp. Returns `None` when nothing fits.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    // Collapse internal runs of whitespace; scraped table cells love them.
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&text) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&text, fmt) {
            return Some(naive.and_utc());
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&text, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}

/// Whole days from `from` to `now`, never negative.
pub fn days_between(from: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - from).num_days().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_iso_and_rfc3339() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 12, 8, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-12T08:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-12 08:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-12T10:30:00+02:00"), Some(expected));
        assert!(parse_timestamp("2024-01-12T08:30:00.123").is_some());
    }

    #[test]
    fn test_european_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 10, 14, 5, 0).unwrap();
        assert_eq!(parse_timestamp("10.01.2024 14:05"), Some(expected));
        assert_eq!(parse_timestamp("10.01.2024   14:05"), Some(expected));
        assert_eq!(parse_timestamp("10/01/2024 14:05"), Some(expected));
    }

    #[test]
    fn test_date_only_is_midnight() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("10.01.2024"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-10"), Some(expected));
    }

    #[test]
    fn test_garbage_is_none() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday-ish"), None);
        assert_eq!(parse_timestamp("32.01.2024 10:00"), None);
    }

    #[test]
    fn test_days_between_floors_at_zero() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 11, 23, 0, 0).unwrap();
        assert_eq!(days_between(a, b), 10);
        assert_eq!(days_between(b, a), 0);
    }
}
