//! Common type definitions.
//!
//! Entity IDs are the integer keys assigned by the database (`SERIAL` columns), wrapped in type
//! aliases so signatures say which entity they refer to.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

// Type aliases for IDs
pub type UserId = i32;
pub type TableId = i32;
pub type ReservationId = i32;

/// Formats accepted for timestamps that carry no UTC offset. These are read as UTC.
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse an ISO-8601 timestamp into a UTC instant.
///
/// Accepts RFC 3339 timestamps (`2024-01-01T20:00:00Z`, `2024-01-01T21:00:00+01:00`), date-times
/// without an offset (taken as UTC) and bare dates (midnight UTC). Returns `None` for anything
/// else.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
