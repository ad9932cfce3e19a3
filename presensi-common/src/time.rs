//! Local calendar-day and wall-clock helpers
//!
//! Attendance is partitioned by the operator's local calendar day, not
//! UTC; a scan at 23:50 local must land in that day's partition even when
//! UTC has already rolled over.

use chrono::{DateTime, Local, NaiveDate};

/// Capture instant for a new attendance record
#[derive(Debug, Clone, Copy)]
pub struct CaptureInstant {
    /// Local calendar day (partition key)
    pub day: NaiveDate,
    /// Epoch milliseconds
    pub at_ms: i64,
    /// Local wall-clock instant
    local: DateTime<Local>,
}

impl CaptureInstant {
    /// Snapshot the current local time
    pub fn now() -> Self {
        Self::from_local(Local::now())
    }

    /// Build from an explicit local timestamp (tests, backfills)
    pub fn from_local(local: DateTime<Local>) -> Self {
        Self {
            day: local.date_naive(),
            at_ms: local.timestamp_millis(),
            local,
        }
    }

    /// Pre-formatted "HH:MM" for display and export
    pub fn formatted_time(&self) -> String {
        self.local.format("%H:%M").to_string()
    }
}

/// Today's local calendar day
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// The trailing `n`-day window ending at `day`, inclusive, oldest first
pub fn trailing_days(day: NaiveDate, n: u32) -> Vec<NaiveDate> {
    (0..n as i64)
        .rev()
        .filter_map(|offset| day.checked_sub_days(chrono::Days::new(offset as u64)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_days_window() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let window = trailing_days(day, 7);
        assert_eq!(window.len(), 7);
        assert_eq!(window[0], NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(window[6], day);
    }

    #[test]
    fn test_trailing_days_crosses_month_boundary() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let window = trailing_days(day, 7);
        assert_eq!(window[0], NaiveDate::from_ymd_opt(2024, 2, 25).unwrap());
    }

    #[test]
    fn test_capture_instant_formats_time() {
        use chrono::TimeZone;
        let local = Local.with_ymd_and_hms(2024, 3, 10, 7, 5, 0).unwrap();
        let instant = CaptureInstant::from_local(local);
        assert_eq!(instant.formatted_time(), "07:05");
        assert_eq!(instant.day, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }
}
