//! # Timestamp Decoding
//!
//! Record dates come from the backend in whatever shape the client that
//! created them produced. All of them end up as a naive wall-clock
//! `NaiveDateTime`, which is what the period bucketer compares against.
//!
//! ```text
//! "2024-03-15T10:30:00.000Z"       → 2024-03-15 10:30:00  (RFC 3339, own offset)
//! "2024-03-15T10:30:00+01:00"      → 2024-03-15 10:30:00
//! "2024-03-15T10:30:00"            → 2024-03-15 10:30:00
//! "2024-03-15 10:30:00"            → 2024-03-15 10:30:00
//! "2024-03-15"                     → 2024-03-15 00:00:00
//! 1710498600000                    → 2024-03-15 10:30:00  (epoch millis, UTC)
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serializer};

use crate::error::{CoreError, CoreResult};

/// Output format used when records are encoded again.
pub const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parses a textual timestamp.
///
/// ## Example
/// ```rust
/// use comptoir_core::timestamp::parse_timestamp;
///
/// let ts = parse_timestamp("2024-02-29").unwrap();
/// assert_eq!(ts.to_string(), "2024-02-29 00:00:00");
/// assert!(parse_timestamp("yesterday").is_err());
/// ```
pub fn parse_timestamp(value: &str) -> CoreResult<NaiveDateTime> {
    let value = value.trim();

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Ok(with_offset.naive_local());
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(chrono::NaiveTime::MIN))
        .map_err(|e| CoreError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Converts epoch milliseconds (JavaScript `Date.getTime()`).
pub fn from_epoch_millis(millis: i64) -> CoreResult<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis)
        .map(|utc| utc.naive_utc())
        .ok_or_else(|| CoreError::InvalidTimestamp {
            value: millis.to_string(),
            reason: "out of range".to_string(),
        })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

/// Serde adapter: `#[serde(with = "crate::timestamp")]`.
pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&value.format(WIRE_FORMAT))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
    let parsed = match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(millis) => from_epoch_millis(millis),
        RawTimestamp::Text(text) => parse_timestamp(&text),
    };
    parsed.map_err(serde::de::Error::custom)
}
