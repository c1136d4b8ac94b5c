//! Time and date parsing utilities.

use crate::error::{Result, TriageError};
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Parse a timestamp given on the command line.
///
/// Supports:
/// - RFC3339: `2025-01-15T12:00:00Z`, `2025-01-15T12:00:00+02:00`
/// - Simple date: `2025-01-15` (midnight UTC)
/// - Relative duration: `-2d`, `+1h`, `-30m`, `-1w`
/// - Keyword: `now`
///
/// # Errors
///
/// Returns a validation error if the format is not recognized.
pub fn parse_timestamp(s: &str, field_name: &str) -> Result<DateTime<Utc>> {
    parse_timestamp_at(s, field_name, Utc::now())
}

fn parse_timestamp_at(s: &str, field_name: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    if s.eq_ignore_ascii_case("now") {
        return Ok(now);
    }

    if let Some(duration) = parse_relative(s) {
        return Ok(now + duration);
    }

    Err(TriageError::validation(
        field_name,
        "invalid time format (try: 2025-01-15, 2025-01-15T12:00:00Z, -2d, now)",
    ))
}

fn parse_relative(s: &str) -> Option<Duration> {
    let negative = s.starts_with('-');
    let rest = s.strip_prefix(['+', '-'])?;
    let unit = rest.chars().last()?;
    let amount = rest[..rest.len() - unit.len_utf8()].parse::<i64>().ok()?;
    let amount = if negative { -amount } else { amount };
    match unit {
        'm' => Some(Duration::minutes(amount)),
        'h' => Some(Duration::hours(amount)),
        'd' => Some(Duration::days(amount)),
        'w' => Some(Duration::weeks(amount)),
        _ => None,
    }
}
