use botdesk_core::BotdeskError;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Format a timestamp the way the schema defaults do
/// (`strftime('%Y-%m-%dT%H:%M:%fZ', 'now')`), so stored values compare
/// correctly as text.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a SQLite datetime text string into a chrono DateTime<Utc>.
pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, BotdeskError> {
    // Try RFC 3339 first (handles the trailing Z)
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Fallback: parse as NaiveDateTime with milliseconds
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.fZ") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    // Fallback: SQLite's CURRENT_TIMESTAMP format
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    Err(BotdeskError::Storage(format!("failed to parse datetime: {s}")))
}

/// Parse an optional SQLite datetime text string.
pub(crate) fn parse_datetime_opt(s: Option<&str>) -> Result<Option<DateTime<Utc>>, BotdeskError> {
    match s {
        Some(s) => Ok(Some(parse_datetime(s)?)),
        None => Ok(None),
    }
}
