//! Common types used throughout Printshop RS

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};

/// Offset the shop displays dates in (KST)
pub const DEFAULT_DISPLAY_OFFSET_HOURS: i32 = 9;

/// Display offset built from whole hours, falling back to UTC when out of range
pub fn display_offset(hours: i32) -> FixedOffset {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

/// Convert an ISO-ish date string into a `YYYY-MM-DD` label in the shop's
/// display offset. Invalid input comes back unchanged.
pub fn format_display_date(date: &str) -> String {
    format_display_date_in(date, display_offset(DEFAULT_DISPLAY_OFFSET_HOURS))
}

/// Same as [`format_display_date`] with an explicit display offset.
///
/// Zoned timestamps are shifted into `offset`; naive timestamps and plain
/// dates are taken as already local.
pub fn format_display_date_in(date: &str, offset: FixedOffset) -> String {
    match parse_display_date(date.trim(), offset) {
        Some(day) => day.format("%Y-%m-%d").to_string(),
        None => date.to_string(),
    }
}

fn parse_display_date(date: &str, offset: FixedOffset) -> Option<NaiveDate> {
    if date.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(dt.with_timezone(&offset).date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date, format) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Form label for a picked date, e.g. `2025년 07월 28일`
pub fn format_form_date(date: NaiveDate) -> String {
    date.format("%Y년 %m월 %d일").to_string()
}

/// Wire format for order/delivery dates
pub fn format_wire_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
