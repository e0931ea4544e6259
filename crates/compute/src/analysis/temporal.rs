use chrono::{Duration, NaiveDate};

/// Length of the "recent" window used by the outcome chart.
pub const RECENT_WINDOW_DAYS: i64 = 30;

pub struct TemporalAnalysis;

impl TemporalAnalysis {
    /// Parse a compact `YYYYMMDD` date. Anything else is `None`.
    pub fn parse_compact_date(yyyymmdd: &str) -> Option<NaiveDate> {
        if yyyymmdd.len() != 8 || !yyyymmdd.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        NaiveDate::parse_from_str(yyyymmdd, "%Y%m%d").ok()
    }

    /// True when `date` falls in the `days`-long window ending at `today`.
    ///
    /// The window is `(today - days, today]`: the day exactly `days` ago is
    /// already outside, today is inside, future dates are outside.
    pub fn within_last_days(date: NaiveDate, today: NaiveDate, days: i64) -> bool {
        date > today - Duration::days(days) && date <= today
    }

    pub fn is_recent(yyyymmdd: Option<&str>, today: NaiveDate) -> bool {
        yyyymmdd
            .and_then(Self::parse_compact_date)
            .is_some_and(|d| Self::within_last_days(d, today, RECENT_WINDOW_DAYS))
    }
}

#[cfg(test)]
mod tests {
    use super::TemporalAnalysis;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn parses_only_compact_dates() {
        assert_eq!(
            TemporalAnalysis::parse_compact_date("20260105"),
            Some(day(2026, 1, 5))
        );
        assert_eq!(TemporalAnalysis::parse_compact_date("2026-01-05"), None);
        assert_eq!(TemporalAnalysis::parse_compact_date("20261305"), None);
        assert_eq!(TemporalAnalysis::parse_compact_date(""), None);
    }

    #[test]
    fn recent_window_bounds() {
        let today = day(2026, 3, 31);
        assert!(TemporalAnalysis::is_recent(Some("20260331"), today));
        assert!(TemporalAnalysis::is_recent(Some("20260302"), today));
        assert!(!TemporalAnalysis::is_recent(Some("20260301"), today));
        assert!(!TemporalAnalysis::is_recent(Some("20260401"), today));
        assert!(!TemporalAnalysis::is_recent(None, today));
    }
}
