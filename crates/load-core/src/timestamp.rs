//! Timestamp parsing for watermark columns.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

/// The fixed format incoming watermark values are expected in.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp input forms the store accepts besides [`TIMESTAMP_FORMAT`].
const STORE_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// A value that is not a timestamp in [`TIMESTAMP_FORMAT`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a timestamp in the form YYYY-MM-DD HH:MM:SS")]
pub struct TimestampParseError {
    pub value: String,
}

/// Parse an incoming file value as a watermark timestamp.
///
/// Surrounding whitespace is ignored; anything else must match
/// [`TIMESTAMP_FORMAT`] exactly.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, TimestampParseError> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).map_err(|_| TimestampParseError {
        value: value.to_string(),
    })
}

/// Parse a value the way the store reads timestamp input.
///
/// Accepts fractional seconds, a `T` separator, minute precision and a bare
/// date (midnight). Used for binding and for values read back from the store;
/// watermark filtering stays on the strict [`parse_timestamp`].
pub fn parse_stored_timestamp(value: &str) -> Result<NaiveDateTime, TimestampParseError> {
    let trimmed = value.trim();
    if let Ok(ts) = parse_timestamp(trimmed) {
        return Ok(ts);
    }
    STORE_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| TimestampParseError {
            value: value.to_string(),
        })
}
