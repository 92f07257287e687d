//! Human-readable renderings of appointment timestamps.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// The four renderings shown in appointment tables and confirmation screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedDateTime {
    /// e.g. `Sun, Mar 15, 2:30 PM`
    pub date_time: String,
    /// e.g. `Sun, 03/15/2026`
    pub date_day: String,
    /// e.g. `Mar 15, 2026`
    pub date_only: String,
    /// e.g. `2:30 PM`
    pub time_only: String,
}

/// Render `at` in 12-hour English formats, in UTC.
pub fn format_date_time(at: DateTime<Utc>) -> FormattedDateTime {
    FormattedDateTime {
        date_time: at.format("%a, %b %-d, %-I:%M %p").to_string(),
        date_day: at.format("%a, %m/%d/%Y").to_string(),
        date_only: at.format("%b %-d, %Y").to_string(),
        time_only: at.format("%-I:%M %p").to_string(),
    }
}
