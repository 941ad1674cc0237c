//! Slack `ts` values ("1601055549.000100") to display strings.
//!
//! Only the whole-second part is used; the fraction is Slack's per-channel
//! uniqueness suffix and carries no display meaning. Times are rendered in
//! UTC so the output does not depend on the host's zone.

use chrono::{DateTime, Datelike, Utc};

use crate::error::TimestampError;

/// `YYYY/MM/DD hh:mm:ss`, 24-hour clock.
pub const DISPLAY_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

pub fn normalize_timestamp(ts: &str) -> Result<String, TimestampError> {
    if ts.is_empty() {
        return Err(TimestampError::EmptyTimestamp);
    }

    let seconds = ts.split_once('.').map_or(ts, |(secs, _)| secs);
    let unix: i64 = seconds
        .parse()
        .map_err(|_| TimestampError::MalformedTimestamp(seconds.to_string()))?;

    // Keep the four-digit year so the output stays fixed width.
    let dt = DateTime::<Utc>::from_timestamp(unix, 0)
        .filter(|dt| (0..=9999).contains(&dt.year()))
        .ok_or_else(|| TimestampError::MalformedTimestamp(seconds.to_string()))?;

    Ok(dt.format(DISPLAY_FORMAT).to_string())
}
