//! Human-facing date and time strings.

use chrono::{NaiveDate, NaiveTime};

/// `"07:05"` -> `"7:05 AM"` (or `"07:05"` with `hour12 = false`).
///
/// Accepts `HH:MM` or `HH:MM:SS`. Unreadable input is returned unchanged.
pub fn format_time(time: &str, hour12: bool) -> String {
    let time = time.trim();
    if time.is_empty() {
        return String::new();
    }
    let parsed = NaiveTime::parse_from_str(time, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"));
    match parsed {
        Ok(t) if hour12 => t.format("%-I:%M %p").to_string(),
        Ok(t) => t.format("%H:%M").to_string(),
        Err(_) => time.to_string(),
    }
}

/// `"2026-10-19"` -> `"Mon, Oct 19"`. Unreadable input is returned unchanged.
pub fn format_date(date: &str) -> String {
    let date = date.trim();
    if date.is_empty() {
        return String::new();
    }
    let day = date.split_once('T').map_or(date, |(d, _)| d);
    match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(d) => d.format("%a, %b %-d").to_string(),
        Err(_) => date.to_string(),
    }
}
