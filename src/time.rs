//! Conversion between archive timestamps and calendar time
//!
//! The messaging archive stores instants as nanoseconds since
//! 2001-01-01T00:00:00Z. Both sides are UTC; no timezone adjustment happens.

use chrono::{DateTime, TimeZone, Utc};

/// Seconds between 1970-01-01 and 2001-01-01
pub const ARCHIVE_EPOCH_OFFSET: i64 = 978_307_200;

/// Archive ticks per second
pub const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Archive nanoseconds to Unix seconds
pub fn to_calendar_seconds(raw: i64) -> f64 {
    raw as f64 / NANOS_PER_SECOND + ARCHIVE_EPOCH_OFFSET as f64
}

/// Unix seconds to archive nanoseconds
pub fn to_archive_nanos(calendar_seconds: f64) -> f64 {
    (calendar_seconds - ARCHIVE_EPOCH_OFFSET as f64) * NANOS_PER_SECOND
}

/// Archive nanoseconds to a UTC instant; 0 means "never" and maps to `None`.
///
/// Integer arithmetic keeps full nanosecond precision here, which the
/// float path above cannot for present-day values.
pub fn archive_to_datetime(raw: i64) -> Option<DateTime<Utc>> {
    if raw == 0 {
        return None;
    }
    let secs = raw.div_euclid(1_000_000_000) + ARCHIVE_EPOCH_OFFSET;
    let nanos = raw.rem_euclid(1_000_000_000) as u32;
    Utc.timestamp_opt(secs, nanos).single()
}

/// A UTC instant to archive nanoseconds, for use as a query bound
pub fn datetime_to_archive(instant: DateTime<Utc>) -> i64 {
    let secs = instant.timestamp() - ARCHIVE_EPOCH_OFFSET;
    secs.saturating_mul(1_000_000_000)
        .saturating_add(i64::from(instant.timestamp_subsec_nanos()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_origin() {
        assert_eq!(to_calendar_seconds(0), 978_307_200.0);
        assert_eq!(to_archive_nanos(978_307_200.0), 0.0);
    }

    #[test]
    fn test_known_instant() {
        // 2024-01-01T00:00:00Z
        let raw = (1_704_067_200 - ARCHIVE_EPOCH_OFFSET) * 1_000_000_000;
        assert_eq!(to_calendar_seconds(raw), 1_704_067_200.0);

        let dt = archive_to_datetime(raw).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(datetime_to_archive(dt), raw);
    }

    #[test]
    fn test_zero_is_never() {
        assert!(archive_to_datetime(0).is_none());
    }

    #[test]
    fn test_subsecond_round_trip() {
        let raw = 725_000_000_123_456_789;
        let dt = archive_to_datetime(raw).unwrap();
        assert_eq!(datetime_to_archive(dt), raw);
    }

    #[test]
    fn test_before_archive_epoch() {
        let dt = archive_to_datetime(-1_500_000_000).unwrap();
        assert_eq!(dt.timestamp(), ARCHIVE_EPOCH_OFFSET - 2);
        assert_eq!(dt.timestamp_subsec_nanos(), 500_000_000);
    }
}
