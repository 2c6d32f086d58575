//! Display helpers shared by consumers of sensor state.

use chrono::DateTime;

/// Format a sensor value with its unit, e.g. "12.5 ppm".
pub fn format_value(value: f64, unit: &str) -> String {
    format!("{} {}", value, unit)
}

/// Format a Unix-millisecond timestamp as a 24-hour UTC clock, e.g. "14:03:09".
pub fn format_clock(timestamp_ms: u64) -> String {
    match i64::try_from(timestamp_ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
    {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => "--:--:--".to_string(),
    }
}

/// Format a Unix-millisecond timestamp as a date, e.g. "May 1, 2024".
pub fn format_date(timestamp_ms: u64) -> String {
    match i64::try_from(timestamp_ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
    {
        Some(dt) => dt.format("%b %-d, %Y").to_string(),
        None => "Unknown".to_string(),
    }
}

/// "Last updated" label: the clock time of the latest reading, or "Never".
pub fn last_updated(timestamp_ms: Option<u64>) -> String {
    timestamp_ms.map_or_else(|| "Never".to_string(), format_clock)
}
