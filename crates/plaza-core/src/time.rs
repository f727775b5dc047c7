//! Relative time labels for posts and messages.
//!
//! Compact labels ("5m", "2h", "3d") are used for recent items; anything a
//! week or older falls back to an absolute date.

use chrono::{DateTime, Datelike, Utc};

/// Compact label for the time elapsed between `then` and `now`.
///
/// Instants in the future are labelled "now".
pub fn format_relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        return "now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m");
    }
    let hours = elapsed.num_hours();
    if hours < 24 {
        return format!("{hours}h");
    }
    let days = elapsed.num_days();
    if days < 7 {
        return format!("{days}d");
    }
    if then.year() == now.year() {
        then.format("%-d %B at %-I:%M %p").to_string()
    } else {
        then.format("%-d %B, %Y at %-I:%M %p").to_string()
    }
}

/// Like [`format_relative`] for an RFC 3339 timestamp. Unparseable input
/// yields an empty label.
pub fn format_relative_str(then: &str, now: DateTime<Utc>) -> String {
    match parse_timestamp(then) {
        Some(then) => format_relative(then, now),
        None => {
            tracing::debug!(input = then, "unparseable timestamp");
            String::new()
        }
    }
}

/// Worded distance such as "5 minutes ago".
pub fn format_distance(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        return "just now".to_string();
    }
    let (amount, unit) = if minutes < 60 {
        (minutes, "minute")
    } else if elapsed.num_hours() < 24 {
        (elapsed.num_hours(), "hour")
    } else if elapsed.num_days() < 30 {
        (elapsed.num_days(), "day")
    } else if elapsed.num_days() < 365 {
        (elapsed.num_days() / 30, "month")
    } else {
        (elapsed.num_days() / 365, "year")
    };
    let plural = if amount == 1 { "" } else { "s" };
    format!("{amount} {unit}{plural} ago")
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(input)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Milliseconds since the Unix epoch to UTC.
pub fn from_millis(ms: u64) -> Option<DateTime<Utc>> {
    i64::try_from(ms).ok().and_then(DateTime::from_timestamp_millis)
}
