//! Timestamp parsing
//!
//! Log entries carry their timestamps as text. Three shapes are accepted:
//!
//! | Shape                  | Example                     | Interpreted as            |
//! |------------------------|-----------------------------|---------------------------|
//! | RFC 3339               | `2024-03-10T18:30:00-05:00` | that instant              |
//! | SQLite `datetime()`    | `2024-03-10 23:30:00`       | that instant, in UTC      |
//! | Calendar date          | `2024-03-10`                | local midnight that day   |

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Key format for daily buckets
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Format produced by SQLite's `datetime('now')`
pub const SQLITE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a stored timestamp into wall-clock time in `tz`.
///
/// Returns `None` for blank or unrecognized input.
pub fn local_datetime<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(tz).naive_local());
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, SQLITE_DATETIME_FORMAT) {
        return Some(Utc.from_utc_datetime(&naive).with_timezone(tz).naive_local());
    }

    // A bare date already names a local calendar day
    NaiveDate::parse_from_str(raw, DATE_KEY_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// True when `raw` is in one of the accepted shapes
pub fn is_valid_timestamp(raw: &str) -> bool {
    local_datetime(raw, &Utc).is_some()
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, s).unwrap()
    }

    #[test]
    fn test_rfc3339_is_shifted_into_display_zone() {
        let est = FixedOffset::west_opt(5 * 3600).unwrap();
        // 02:00 UTC on the 11th is still the evening of the 10th in UTC-5
        let local = local_datetime("2024-03-11T02:00:00Z", &est).unwrap();
        assert_eq!(local, ymd_hms(2024, 3, 10, 21, 0, 0));
    }

    #[test]
    fn test_sqlite_datetime_is_utc() {
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let local = local_datetime("2024-03-10 20:00:00", &ist).unwrap();
        assert_eq!(local, ymd_hms(2024, 3, 11, 1, 30, 0));
    }

    #[test]
    fn test_bare_date_is_local_midnight_in_any_zone() {
        let est = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(local_datetime("2024-03-10", &est), Some(ymd_hms(2024, 3, 10, 0, 0, 0)));
        assert_eq!(local_datetime("2024-03-10", &Utc), Some(ymd_hms(2024, 3, 10, 0, 0, 0)));
    }

    #[test]
    fn test_rejects_malformed() {
        for raw in ["", "   ", "yesterday", "2024-13-01", "2024-02-30", "10/03/2024"] {
            assert!(!is_valid_timestamp(raw), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn test_date_key() {
        assert_eq!(date_key(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()), "2024-03-04");
    }
}
