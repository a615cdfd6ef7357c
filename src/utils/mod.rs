//! Utility modules.

pub mod date;

pub use date::{DAY_FORMAT, date_timestamp, day_string, day_timestamp, timestamp_to_day, today};
