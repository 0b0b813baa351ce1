//! Conversion between epoch milliseconds and UTC instants.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};

/// Timestamp in milliseconds since Unix epoch (UTC).
pub type TimestampMs = i64;

/// Convert epoch milliseconds to a UTC instant, keeping millisecond precision.
pub fn ms_to_utc(ms: TimestampMs) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| Error::conversion(format!("timestamp out of range: {ms} ms")))
}

/// Convert a UTC instant to epoch milliseconds (sub-millisecond part truncated).
#[inline]
pub fn utc_to_ms(dt: DateTime<Utc>) -> TimestampMs {
    dt.timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_ms_to_utc_keeps_millis() {
        // 2024-01-01 00:01:30.500
        let dt = ms_to_utc(1_704_067_290_500).unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 1, 30).unwrap()
            + chrono::Duration::milliseconds(500);
        assert_eq!(dt, expected);
        assert_eq!(dt.nanosecond(), 500_000_000);
    }

    #[test]
    fn test_round_trip() {
        let ms = 1_499_040_059_999;
        assert_eq!(utc_to_ms(ms_to_utc(ms).unwrap()), ms);
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(ms_to_utc(i64::MAX), Err(Error::Conversion(_))));
    }
}
