use chrono::{DateTime, Utc};

/// Zero-padded `YYYY-MM-DD` calendar date of a publish timestamp, in UTC.
pub fn format_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}
