// ABOUTME: SMPP absolute time strings (YYMMDDhhmmsstnnp) for validity_period
// ABOUTME: Formats "now + ttl" in UTC and parses absolute times back for checks and receipts

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

/// Suffix appended to every generated validity period: tenths of a second,
/// quarter-hour offset from UTC and the offset direction. The time is always
/// rendered in UTC so the offset is zero.
pub const UTC_SUFFIX: &str = "000+";

const TIMESTAMP_FORMAT: &str = "%y%m%d%H%M%S";

#[derive(Debug, Error, PartialEq)]
pub enum DateTimeError {
    #[error("SMPP time must be 16 characters, got {0}")]
    InvalidLength(usize),

    #[error("invalid SMPP time '{0}'")]
    InvalidFormat(String),

    #[error("relative SMPP times are not supported here")]
    Relative,
}

/// Absolute validity period `ttl_secs` from now.
pub fn validity_period(ttl_secs: u32) -> String {
    validity_period_at(Utc::now(), ttl_secs)
}

/// Absolute validity period `ttl_secs` after `now`, formatted as
/// `yyMMddHHmmss` followed by [`UTC_SUFFIX`].
pub fn validity_period_at(now: DateTime<Utc>, ttl_secs: u32) -> String {
    let expiry = now + Duration::seconds(i64::from(ttl_secs));
    format!("{}{}", expiry.format(TIMESTAMP_FORMAT), UTC_SUFFIX)
}

/// Parse an absolute SMPP time into UTC, honouring the tenths digit and the
/// quarter-hour offset.
pub fn parse_absolute(value: &str) -> Result<DateTime<Utc>, DateTimeError> {
    if value.len() != 16 {
        return Err(DateTimeError::InvalidLength(value.len()));
    }
    let invalid = || DateTimeError::InvalidFormat(value.to_string());
    if !value.is_ascii() {
        return Err(invalid());
    }

    let (stamp, rest) = value.split_at(12);
    let naive = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).map_err(|_| invalid())?;

    let bytes = rest.as_bytes();
    let tenths = (bytes[0] as char).to_digit(10).ok_or_else(invalid)?;
    let quarters: i64 = rest[1..3].parse().map_err(|_| invalid())?;
    let offset = Duration::minutes(quarters * 15);

    let local = Utc.from_utc_datetime(&naive) + Duration::milliseconds(i64::from(tenths) * 100);
    match bytes[3] {
        b'+' => Ok(local - offset),
        b'-' => Ok(local + offset),
        b'R' => Err(DateTimeError::Relative),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_period_format() {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(validity_period_at(now, 60), "250102030505000+");
        assert_eq!(validity_period_at(now, 0), "250102030405000+");
    }

    #[test]
    fn validity_period_rolls_over_year() {
        let now = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 30).unwrap();
        assert_eq!(validity_period_at(now, 45), "260101000015000+");
    }

    #[test]
    fn same_second_same_output() {
        let now = Utc.with_ymd_and_hms(2030, 6, 15, 12, 0, 0).unwrap();
        assert_eq!(validity_period_at(now, 3600), validity_period_at(now, 3600));
    }

    #[test]
    fn ttl_difference_is_preserved() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap();
        let short = parse_absolute(&validity_period_at(now, 10)).unwrap();
        let long = parse_absolute(&validity_period_at(now, 70)).unwrap();
        assert_eq!((long - short).num_seconds(), 60);
    }

    #[test]
    fn live_clock_matches_ttl() {
        let before = Utc::now();
        let parsed = parse_absolute(&validity_period(120)).unwrap();
        let delta = (parsed - before).num_seconds();
        assert!((119..=121).contains(&delta), "delta was {delta}");
    }

    #[test]
    fn parse_absolute_offsets() {
        let utc = parse_absolute("250102030405000+").unwrap();
        let east = parse_absolute("250102040405004+").unwrap();
        assert_eq!(utc, east);
        assert_eq!(parse_absolute("250102030405000R"), Err(DateTimeError::Relative));
        assert!(matches!(parse_absolute("2501"), Err(DateTimeError::InvalidLength(4))));
        assert!(parse_absolute("251302030405000+").is_err());
        // 16 bytes, but not 16 characters
        assert!(matches!(
            parse_absolute("250102030405é0+"),
            Err(DateTimeError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_absolute("25010203040é00+"),
            Err(DateTimeError::InvalidFormat(_))
        ));
    }
}
