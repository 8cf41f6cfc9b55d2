//! Observation-date helpers
//!
//! Observation keys are calendar dates in a single configured local time
//! zone, expressed as a fixed UTC offset. Dates are computed once at the
//! zone boundary and never UTC-shifted afterwards.

use crate::ConfigError;
use chrono::{FixedOffset, NaiveDate, Utc};

/// Parses a configured UTC offset string such as `"-08:00"` or `"+05:30"`
///
/// # Arguments
///
/// * `value` - The offset string from configuration
///
/// # Returns
///
/// * `Ok(FixedOffset)` - The parsed offset
/// * `Err(ConfigError)` - The string is not a valid `±HH:MM` offset
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, ConfigError> {
    value
        .parse::<FixedOffset>()
        .map_err(|_| ConfigError::InvalidOffset(value.to_string()))
}

/// Returns today's calendar date in the configured zone
pub fn today_in_offset(offset: &FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(offset).date_naive()
}

/// Formats a date the way digest consumers expect (`YYYY-MM-DD`)
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
