//! Day-granularity date helpers.
//!
//! Publish dates are always truncated to day granularity before being
//! persisted as vector metadata or used in range filters. Conversions are
//! pinned to UTC midnight so range filters do not depend on the host
//! timezone.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::DateError;

/// Canonical day-granularity format.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Parse a canonical `YYYY-MM-DD` string into epoch seconds at UTC midnight.
///
/// An invalid string fails fast; the caller decides whether that skips a
/// document or aborts a search.
pub fn day_timestamp(value: &str) -> Result<i64, DateError> {
    let date =
        NaiveDate::parse_from_str(value, DAY_FORMAT).map_err(|source| DateError::InvalidDate {
            value: value.to_string(),
            source,
        })?;
    Ok(date_timestamp(date))
}

/// Epoch seconds at UTC midnight for an already-parsed date.
pub fn date_timestamp(date: NaiveDate) -> i64 {
    NaiveDateTime::new(date, NaiveTime::MIN).and_utc().timestamp()
}

/// Render epoch seconds back to the UTC day they fall on.
pub fn timestamp_to_day(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.format(DAY_FORMAT).to_string())
        .unwrap_or_default()
}

/// Day-granularity string for a timestamp.
pub fn day_string(dt: &DateTime<Utc>) -> String {
    dt.format(DAY_FORMAT).to_string()
}

/// Today as a canonical day string (UTC).
pub fn today() -> String {
    day_string(&Utc::now())
}
