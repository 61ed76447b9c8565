//! Date/time utilities for tgfeed.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Short timestamp used in notification headers, e.g. `Jan/2 15:04`.
pub const SHORT_TIMESTAMP_FORMAT: &str = "%b/%-d %H:%M";

/// Format a DateTime<Utc> in the specified timezone.
///
/// # Arguments
///
/// * `dt` - DateTime in UTC
/// * `timezone` - Timezone name (e.g., "Asia/Kolkata", "UTC")
/// * `format` - Output format string (e.g., "%b/%-d %H:%M")
///
/// # Returns
///
/// Formatted datetime string. An unknown timezone falls back to UTC.
pub fn format_utc_datetime(dt: &DateTime<Utc>, timezone: &str, format: &str) -> String {
    let tz: Tz = match timezone.parse() {
        Ok(tz) => tz,
        Err(_) => return dt.format(format).to_string(),
    };
    dt.with_timezone(&tz).format(format).to_string()
}

/// Format a DateTime<Utc> as a short localized timestamp.
pub fn format_short(dt: &DateTime<Utc>, timezone: &str) -> String {
    format_utc_datetime(dt, timezone, SHORT_TIMESTAMP_FORMAT)
}
