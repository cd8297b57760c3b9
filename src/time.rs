//! Conversion between datetimes and unix timestamps in nanoseconds.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Converts a nanosecond timestamp to a datetime in `tz`.
pub fn from_ns_timestamp<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> DateTime<Tz> {
    Utc.timestamp_nanos(timestamp).with_timezone(tz)
}

/// Converts a nanosecond timestamp to a UTC datetime.
pub fn from_ns_timestamp_utc(timestamp: i64) -> DateTime<Utc> {
    from_ns_timestamp(timestamp, &Utc)
}

/// Converts a datetime to a nanosecond timestamp.
///
/// Precision is truncated to microseconds: the result is always a multiple
/// of 1000. The result is an `i128`, since nanoseconds past 2262-04-11 do not
/// fit in an `i64` while every datetime chrono can represent fits here.
pub fn to_ns_timestamp<Tz: TimeZone>(date_time: &DateTime<Tz>) -> i128 {
    i128::from(date_time.timestamp_micros()) * 1_000
}

/// Like [`to_ns_timestamp`], reading a naive datetime as UTC.
pub fn to_ns_timestamp_naive(date_time: &NaiveDateTime) -> i128 {
    to_ns_timestamp(&date_time.and_utc())
}
