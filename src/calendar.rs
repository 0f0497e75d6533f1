//! Date arithmetic for the weekly and monthly correlation windows.
//!
//! Weekly windows never cross a month boundary: the monthly run plus the
//! month-end leftover run partition each month without double counting.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

/// First calendar day of `d`'s month.
pub fn month_first_day(d: NaiveDate) -> NaiveDate {
    d - Days::new(u64::from(d.day0()))
}

/// Last calendar day of `d`'s month, leap years and December included.
pub fn month_last_day(d: NaiveDate) -> NaiveDate {
    month_first_day(d) + Months::new(1) - Days::new(1)
}

pub fn is_month_end(d: NaiveDate) -> bool {
    d == month_last_day(d)
}

/// Most recent Sunday that is `<= d`.
pub fn last_sunday_on_or_before(d: NaiveDate) -> NaiveDate {
    d - Days::new(u64::from(d.weekday().num_days_from_sunday()))
}

/// Trailing 7-day window ending at `today`, clamped to the start of `today`'s month.
pub fn weekly_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today - Days::new(6);
    if start.month() != today.month() {
        return (month_first_day(today), today);
    }
    (start, today)
}

/// The whole calendar month containing `today`.
pub fn monthly_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (month_first_day(today), month_last_day(today))
}

/// Days after the month's last Sunday that no regular weekly run covered.
///
/// Returns `None` when the month ends on a Sunday.
pub fn leftover_weekly_range_for_month_end(today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let end = month_last_day(today);
    let start = last_sunday_on_or_before(end) + Days::new(1);
    if start.month() == end.month() && start <= end {
        Some((start, end))
    } else {
        None
    }
}

pub fn is_sunday(d: NaiveDate) -> bool {
    d.weekday() == Weekday::Sun
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn every_day(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
        from.iter_days().take_while(move |d| *d <= to)
    }

    #[test]
    fn test_last_sunday_calculation() {
        // Friday
        assert_eq!(last_sunday_on_or_before(date(2025, 10, 31)), date(2025, 10, 26));
        // Sunday maps to itself
        assert_eq!(last_sunday_on_or_before(date(2025, 10, 26)), date(2025, 10, 26));
        // Monday
        assert_eq!(last_sunday_on_or_before(date(2024, 9, 30)), date(2024, 9, 29));
    }

    #[test]
    fn test_last_sunday_properties_hold_for_every_day() {
        for d in every_day(date(2019, 12, 1), date(2026, 3, 1)) {
            let sun = last_sunday_on_or_before(d);
            assert!(sun <= d);
            assert_eq!(sun.weekday(), Weekday::Sun);
            assert!((d - sun).num_days() < 7, "skipped a Sunday for {d}");
        }
    }

    #[test]
    fn test_month_last_day_leap_years() {
        assert_eq!(month_last_day(date(2024, 2, 10)), date(2024, 2, 29));
        assert_eq!(month_last_day(date(2023, 2, 10)), date(2023, 2, 28));
        assert_eq!(month_last_day(date(2024, 12, 5)), date(2024, 12, 31));
        assert_eq!(month_last_day(date(2024, 4, 30)), date(2024, 4, 30));
    }

    #[test]
    fn test_month_last_day_properties_hold_for_every_day() {
        for d in every_day(date(2019, 1, 1), date(2025, 12, 31)) {
            let last = month_last_day(d);
            assert_eq!((last.year(), last.month()), (d.year(), d.month()));
            assert_eq!(last.succ_opt().unwrap().day(), 1);
        }
    }

    #[test]
    fn test_weekly_window_mid_month() {
        assert_eq!(weekly_window(date(2024, 9, 18)), (date(2024, 9, 12), date(2024, 9, 18)));
    }

    #[test]
    fn test_weekly_window_month_end() {
        assert_eq!(weekly_window(date(2024, 7, 31)), (date(2024, 7, 25), date(2024, 7, 31)));
    }

    #[test]
    fn test_weekly_window_same_month_guard() {
        // 2024-09-01 is a Sunday
        assert_eq!(weekly_window(date(2024, 9, 1)), (date(2024, 9, 1), date(2024, 9, 1)));
        assert_eq!(weekly_window(date(2024, 9, 3)), (date(2024, 9, 1), date(2024, 9, 3)));
    }

    #[test]
    fn test_weekly_window_never_spans_more_than_seven_days() {
        for d in every_day(date(2023, 1, 1), date(2024, 12, 31)) {
            let (start, end) = weekly_window(d);
            assert_eq!(end, d);
            assert!((end - start).num_days() <= 6);
            assert_eq!(start.month(), end.month());
        }
    }

    #[test]
    fn test_monthly_window() {
        assert_eq!(monthly_window(date(2025, 10, 15)), (date(2025, 10, 1), date(2025, 10, 31)));
        assert_eq!(monthly_window(date(2024, 2, 29)), (date(2024, 2, 1), date(2024, 2, 29)));
    }

    #[test]
    fn test_leftover_range_oct_2025() {
        assert_eq!(
            leftover_weekly_range_for_month_end(date(2025, 10, 31)),
            Some((date(2025, 10, 27), date(2025, 10, 31)))
        );
    }

    #[test]
    fn test_leftover_range_month_ends_monday() {
        assert_eq!(
            leftover_weekly_range_for_month_end(date(2024, 9, 30)),
            Some((date(2024, 9, 30), date(2024, 9, 30)))
        );
    }

    #[test]
    fn test_leftover_range_month_ends_sunday() {
        assert_eq!(leftover_weekly_range_for_month_end(date(2020, 5, 31)), None);
    }

    #[test]
    fn test_is_month_end() {
        assert!(is_month_end(date(2024, 2, 29)));
        assert!(!is_month_end(date(2023, 2, 27)));
    }
}
