//! Deadline parsing and display.
//!
//! Teachers type deadlines as `YYYY-MM-DD` (23:59 implied) or
//! `YYYY-MM-DD HH:MM`. Both are read as UTC.

use jiff::Timestamp;
use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;

use crate::error::CoreError;

pub fn parse_deadline(input: &str) -> Result<Timestamp, CoreError> {
    let text = input.trim();
    let invalid = |reason: String| CoreError::InvalidDeadline {
        input: text.to_string(),
        reason,
    };

    let unparsable = |e: jiff::Error| invalid(e.to_string());
    let civil: DateTime = if text.len() == 10 {
        let date: Date = text.parse().map_err(unparsable)?;
        date.at(23, 59, 0, 0)
    } else {
        text.parse().map_err(unparsable)?
    };

    let zoned = civil
        .to_zoned(TimeZone::UTC)
        .map_err(|e| invalid(e.to_string()))?;
    Ok(zoned.timestamp())
}

/// Render a deadline for the given locale. English locales get the long
/// form; everything else gets ISO-style.
pub fn format_deadline(at: Timestamp, locale: &str) -> String {
    if locale.starts_with("en") {
        at.strftime("%B %d, %Y at %I:%M %p UTC").to_string()
    } else {
        at.strftime("%Y-%m-%d %H:%M UTC").to_string()
    }
}
