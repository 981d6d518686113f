//! Time helpers for business timezone conversion
//!
//! All date→timestamp conversion happens at the API handler layer;
//! repositories only receive `i64` Unix millis.

use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// Current time as Unix millis
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Parse a date string (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// Parse a month string (YYYY-MM) into (year, month)
pub fn parse_month(month: &str) -> AppResult<(i32, u32)> {
    let parsed = NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid month format: {}", month)))?;
    Ok((parsed.year(), parsed.month()))
}

/// Date + hour/min/sec → Unix millis (business timezone)
///
/// DST gap fallback: if the local time does not exist, fall back to UTC.
pub fn date_hms_to_millis(date: NaiveDate, hour: u32, min: u32, sec: u32, tz: Tz) -> i64 {
    let naive = date.and_hms_opt(hour, min, sec).unwrap_or_default();
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// Start of day (00:00:00) → Unix millis (business timezone)
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    date_hms_to_millis(date, 0, 0, 0, tz)
}

/// End of day → next day 00:00:00 Unix millis (business timezone)
///
/// Callers use `< end` (exclusive) semantics.
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    let next_day = date.succ_opt().unwrap_or(date);
    date_hms_to_millis(next_day, 0, 0, 0, tz)
}

/// Half-open `[start, end)` millis window for a calendar month (business timezone)
pub fn month_window(year: i32, month: u32, tz: Tz) -> (i64, i64) {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or_default());
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .unwrap_or(start);
    (day_start_millis(start, tz), day_start_millis(end, tz))
}

/// Month window containing the given timestamp (business timezone)
pub fn month_window_of(ts_millis: i64, tz: Tz) -> (i64, i64) {
    let dt = match Utc.timestamp_millis_opt(ts_millis).single() {
        Some(dt) => dt.with_timezone(&tz),
        None => Utc::now().with_timezone(&tz),
    };
    month_window(dt.year(), dt.month(), tz)
}

/// (year, month) of the current moment in the business timezone
pub fn current_month(tz: Tz) -> (i32, u32) {
    let now = Utc::now().with_timezone(&tz);
    (now.year(), now.month())
}
