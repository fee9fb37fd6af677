//! Preset range calculator
//!
//! Pure functions of "now"; none of them can fail.

use crate::types::{CalendarType, DateRange, RangeType};
use crate::utils::time::{end_of_day, month_end, month_start, start_of_day, week_start};
use chrono::{Duration, NaiveDateTime};

/// Days added to the anchor of a week-shaped range
pub const WEEK_SPAN_DAYS: i64 = 6;
/// Days added to the anchor of a month-shaped range
pub const MONTH_SPAN_DAYS: i64 = 30;

pub fn preset_range(kind: RangeType, now: NaiveDateTime, display_format: &str) -> DateRange {
    let today = now.date();

    let (from, to) = match kind {
        // Custom has no algorithmic bounds; it starts out as today
        RangeType::Today | RangeType::Custom => (today, today),
        RangeType::ThisWeek => {
            let sunday = week_start(today);
            (sunday, sunday + Duration::days(WEEK_SPAN_DAYS))
        }
        RangeType::LastWeek => {
            let sunday = week_start(today) - Duration::days(7);
            (sunday, sunday + Duration::days(WEEK_SPAN_DAYS))
        }
        RangeType::ThisMonth => (month_start(today), month_end(today)),
        RangeType::LastMonth => {
            let last_of_previous = month_start(today) - Duration::days(1);
            (month_start(last_of_previous), last_of_previous)
        }
    };

    DateRange::with_display_format(start_of_day(from), end_of_day(to), kind, display_format)
}

/// Range a screen commits on mount when no `dateInput` is supplied.
///
/// Month-shaped screens anchor on the first of the month and keep the
/// fixed 30-day span every month-shaped range has.
pub fn default_range(calendar_type: CalendarType, now: NaiveDateTime, display_format: &str) -> DateRange {
    match calendar_type {
        CalendarType::Free => preset_range(RangeType::Today, now, display_format),
        CalendarType::Week => preset_range(RangeType::ThisWeek, now, display_format),
        CalendarType::Month => {
            let first = month_start(now.date());
            DateRange::with_display_format(
                start_of_day(first),
                end_of_day(first + Duration::days(MONTH_SPAN_DAYS)),
                RangeType::ThisMonth,
                display_format,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_DISPLAY_FORMAT;
    use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
    }

    fn preset(kind: RangeType, now: NaiveDateTime) -> DateRange {
        preset_range(kind, now, DEFAULT_DISPLAY_FORMAT)
    }

    fn end_time() -> NaiveTime {
        NaiveTime::from_hms_opt(23, 59, 59).unwrap()
    }

    #[test]
    fn test_today_spans_one_calendar_day() {
        for now in [at(2026, 10, 16, 14, 5), at(2026, 1, 1, 0, 0), at(2028, 2, 29, 23, 59)] {
            let range = preset(RangeType::Today, now);
            assert_eq!(range.from_date_raw().date(), now.date());
            assert_eq!(range.to_date_raw().date(), now.date());
            assert_eq!(range.from_date_raw().time(), NaiveTime::MIN);
            assert_eq!(range.to_date_raw().time(), end_time());
            assert_eq!(range.range_type(), RangeType::Today);
        }
    }

    #[test]
    fn test_this_week_runs_sunday_to_saturday() {
        // every weekday of one week, including the Sunday and Saturday edges
        for day in 11..=17 {
            let range = preset(RangeType::ThisWeek, at(2026, 10, day, 9, 0));
            assert_eq!(range.from_date_raw().weekday(), Weekday::Sun);
            assert_eq!(range.to_date_raw().weekday(), Weekday::Sat);
            assert_eq!(range.from_date_raw().date(), NaiveDate::from_ymd_opt(2026, 10, 11).unwrap());
            assert_eq!((range.to_date_raw().date() - range.from_date_raw().date()).num_days(), 6);
            assert_eq!(range.to_date_raw().time(), end_time());
        }
    }

    #[test]
    fn test_last_week_precedes_this_week() {
        let now = at(2026, 10, 16, 9, 0);
        let this_week = preset(RangeType::ThisWeek, now);
        let last_week = preset(RangeType::LastWeek, now);
        assert_eq!(last_week.from_date(), "2026-10-04T00:00:00");
        assert_eq!(last_week.to_date(), "2026-10-10T23:59:59");
        assert_eq!(
            last_week.to_date_raw().date().succ_opt().unwrap(),
            this_week.from_date_raw().date()
        );
    }

    #[test]
    fn test_last_week_crosses_year_boundary() {
        let range = preset(RangeType::LastWeek, at(2027, 1, 5, 12, 0));
        assert_eq!(range.from_date(), "2026-12-27T00:00:00");
        assert_eq!(range.to_date(), "2027-01-02T23:59:59");
    }

    #[test]
    fn test_this_month_covers_calendar_month() {
        let range = preset(RangeType::ThisMonth, at(2026, 2, 14, 8, 0));
        assert_eq!(range.from_date(), "2026-02-01T00:00:00");
        assert_eq!(range.to_date(), "2026-02-28T23:59:59");
    }

    #[test]
    fn test_last_month_in_january() {
        let range = preset(RangeType::LastMonth, at(2026, 1, 20, 8, 0));
        assert_eq!(range.from_date(), "2025-12-01T00:00:00");
        assert_eq!(range.to_date(), "2025-12-31T23:59:59");
        assert_eq!(range.range_display(), "Dec 1 - Dec 31");
    }

    #[test]
    fn test_custom_preset_starts_as_today() {
        let now = at(2026, 10, 16, 9, 0);
        let range = preset(RangeType::Custom, now);
        assert_eq!(range.range_type(), RangeType::Custom);
        assert_eq!(range.from_date_raw(), preset(RangeType::Today, now).from_date_raw());
    }

    #[test]
    fn test_default_range_per_calendar_type() {
        let now = at(2026, 10, 16, 9, 0);
        assert_eq!(default_range(CalendarType::Free, now, DEFAULT_DISPLAY_FORMAT).range_type(), RangeType::Today);
        assert_eq!(default_range(CalendarType::Week, now, DEFAULT_DISPLAY_FORMAT).range_type(), RangeType::ThisWeek);

        let month = default_range(CalendarType::Month, now, DEFAULT_DISPLAY_FORMAT);
        assert_eq!(month.from_date(), "2026-10-01T00:00:00");
        assert_eq!(month.to_date(), "2026-10-31T23:59:59");
        assert_eq!(month.to_date_raw().date() - month.from_date_raw().date(), Duration::days(30));
    }
}
