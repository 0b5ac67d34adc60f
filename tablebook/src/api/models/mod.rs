//! API request/response models.
//!
//! JSON field names are camelCase. Request types derive [`validator::Validate`] for shape checks
//! (non-empty names, valid emails, positive ids and durations, ISO 8601 timestamps); business
//! rules live in [`crate::engine`].

pub mod pagination;
pub mod reservations;
pub mod tables;
pub mod users;

use crate::errors::{Error, Result};
use crate::types::parse_timestamp;
use chrono::{DateTime, Utc};
use validator::ValidationError;

pub(crate) const INVALID_TIMESTAMP_MESSAGE: &str = "Date must be in ISO 8601 format";

/// Validator for fields holding an ISO 8601 timestamp.
pub(crate) fn validate_timestamp(value: &str) -> std::result::Result<(), ValidationError> {
    match parse_timestamp(value) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("iso8601").with_message(INVALID_TIMESTAMP_MESSAGE.into())),
    }
}

/// Parse a timestamp field that has already passed [`validate_timestamp`].
pub(crate) fn request_timestamp(value: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(value).ok_or_else(|| Error::bad_request(INVALID_TIMESTAMP_MESSAGE))
}
