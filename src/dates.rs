//! Date formatting for pages and feeds. Post dates are calendar dates with
//! no time of day, so every timestamp is midnight UTC.

use chrono::NaiveDate;

/// Formats a date for humans, e.g. `1 June 2023`.
pub fn readable(date: NaiveDate) -> String {
    date.format("%-d %B %Y").to_string()
}

/// Formats a date as an ISO-8601 timestamp at midnight UTC, e.g.
/// `2023-06-01T00:00:00.000Z`.
pub fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%dT00:00:00.000Z").to_string()
}

/// Formats a date the way British locales print a date and time, e.g.
/// `01/06/2023, 00:00:00`. Used for tooltips.
pub fn locale(date: NaiveDate) -> String {
    date.format("%d/%m/%Y, 00:00:00").to_string()
}
