//! Timestamp text encoding used by the datastore.
//!
//! Timestamps are stored as RFC 3339 strings in UTC with microsecond
//! precision, which keeps them lexicographically sortable.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::DomainError;

/// Fractional-second digits kept in storage.
pub const TIMESTAMP_PRECISION: u16 = 6;

/// Format a timestamp for storage.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use townsquare_domain::format_timestamp;
///
/// let dt = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
/// assert_eq!(format_timestamp(dt), "2024-01-15T10:30:00.000000Z");
/// ```
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored RFC 3339 timestamp, converting any offset to UTC.
///
/// # Errors
///
/// Returns `DomainError::Parse` if the string is not valid RFC 3339.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DomainError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DomainError::parse(format!("invalid timestamp {s:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn parse_converts_offset_to_utc() {
        let dt = parse_timestamp("2024-01-15T10:30:00+05:00").unwrap();
        assert_eq!(dt.hour(), 5);
    }

    #[test]
    fn parse_rejects_date_only_and_garbage() {
        assert!(parse_timestamp("2024-01-15").is_err());
        assert!(parse_timestamp("").is_err());
        assert!(matches!(
            parse_timestamp("not-a-date"),
            Err(DomainError::Parse(_))
        ));
    }

    #[test]
    fn format_then_parse_keeps_microseconds() {
        let dt = Utc
            .with_ymd_and_hms(2024, 2, 29, 23, 59, 59)
            .unwrap()
            .with_nanosecond(123_456_000)
            .unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(dt)).unwrap(), dt);
    }
}
