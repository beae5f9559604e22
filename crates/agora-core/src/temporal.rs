//! Timestamp normalization.
//!
//! Timestamps are normalized explicitly at the points where they enter the
//! system: when a document reports its creation time, and when an event is
//! assigned its timestamp. Two logically equal instants always normalize to
//! the same value, whatever offset they were expressed in.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Convert a timestamp in any time zone to UTC.
#[must_use]
pub fn normalize_utc<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> DateTime<Utc> {
    timestamp.with_timezone(&Utc)
}

/// Convert a timestamp to UTC and drop the time zone.
#[must_use]
pub fn normalize_naive_utc<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> NaiveDateTime {
    normalize_utc(timestamp).naive_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn offsets_normalize_to_same_instant() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let minus_five = FixedOffset::west_opt(5 * 3600).unwrap();

        let a = plus_two.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap();
        let b = minus_five.with_ymd_and_hms(2023, 12, 31, 19, 0, 0).unwrap();

        assert_eq!(normalize_utc(&a), normalize_utc(&b));
        assert_eq!(normalize_naive_utc(&a), naive(2024, 1, 1, 0, 0, 0));
        assert_eq!(normalize_naive_utc(&b), naive(2024, 1, 1, 0, 0, 0));
    }

    #[test]
    fn utc_input_is_unchanged() {
        let ts = Utc.with_ymd_and_hms(2025, 2, 10, 9, 15, 0).unwrap();
        assert_eq!(normalize_utc(&ts), ts);
        assert_eq!(normalize_naive_utc(&ts), naive(2025, 2, 10, 9, 15, 0));
    }

    #[test]
    fn sub_second_precision_is_kept() {
        let ts = Utc.with_ymd_and_hms(2025, 2, 10, 9, 15, 0).unwrap()
            + chrono::Duration::milliseconds(250);
        assert_eq!(
            normalize_naive_utc(&ts).and_utc().timestamp_subsec_millis(),
            250
        );
    }
}
