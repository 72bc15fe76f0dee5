//! Date and timestamp normalization for tool inputs.
//!
//! Agents tend to pass either a bare calendar date (`2026-02-28`) or a full
//! RFC 3339 timestamp. Query bounds need a full timestamp, event start/end
//! values distinguish all-day dates from timed values.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Format of a bare calendar date.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Naive (offset-less) timestamp accepted for event times paired with a
/// `timeZone`.
const NAIVE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Errors produced while normalizing user-supplied times.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    /// Value is neither a date nor an RFC 3339 timestamp.
    #[error("invalid timestamp {value:?}: expected YYYY-MM-DD or RFC 3339")]
    InvalidTimestamp { value: String },

    /// Value is neither a date nor a (possibly offset-less) date-time.
    #[error("invalid event time {value:?}: expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS[offset]")]
    InvalidEventTime { value: String },
}

/// Returns `true` if `value` is a bare `YYYY-MM-DD` date.
pub fn is_date_only(value: &str) -> bool {
    parse_date(value).is_some()
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Expands a bare date to midnight UTC and validates anything else as
/// RFC 3339.
///
/// The returned string is passed verbatim to the remote API, so a valid
/// timestamp keeps the offset the caller wrote.
pub fn expand_timestamp(value: &str) -> Result<String, TimeError> {
    let value = value.trim();
    if is_date_only(value) {
        return Ok(format!("{value}T00:00:00Z"));
    }
    DateTime::parse_from_rfc3339(value).map_err(|_| TimeError::InvalidTimestamp {
        value: value.to_string(),
    })?;
    Ok(value.to_string())
}

/// The start or end of a calendar event as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTime {
    /// An all-day date.
    AllDay(NaiveDate),
    /// A timed value, kept as written (RFC 3339, or offset-less when a
    /// time zone is supplied separately).
    Timed(String),
}

impl EventTime {
    /// Parses a caller-supplied event time.
    pub fn parse(value: &str) -> Result<Self, TimeError> {
        let value = value.trim();
        if let Some(date) = parse_date(value) {
            return Ok(Self::AllDay(date));
        }
        let valid = DateTime::parse_from_rfc3339(value).is_ok()
            || NaiveDateTime::parse_from_str(value, NAIVE_DATETIME_FORMAT).is_ok();
        if valid {
            Ok(Self::Timed(value.to_string()))
        } else {
            Err(TimeError::InvalidEventTime {
                value: value.to_string(),
            })
        }
    }
}
