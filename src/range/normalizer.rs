//! Range normalizer: turns widget selections and preset picks into committed
//! `DateRange`s.
//!
//! A rejected interaction is not an error for the user. Callers receive a
//! [`Rejection`] describing why, log it, and keep the previous range.

use super::preset::{preset_range, MONTH_SPAN_DAYS, WEEK_SPAN_DAYS};
use super::widget::Selection;
use crate::config::DashboardConfig;
use crate::types::{CalendarType, DateRange, LimitCalendar, RangeType, TimeOfDay};
use crate::utils::time::{end_of_day, LookbackWindow};
use chrono::{Duration, NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("nothing selected")]
    NothingSelected,

    #[error("{date} is outside the selectable window ({earliest} to {latest})")]
    OutsideLookback {
        date: NaiveDate,
        earliest: NaiveDate,
        latest: NaiveDate,
    },

    #[error("range spans {days} days, limit is {max}")]
    ExceedsLimit { days: i64, max: i64 },
}

/// Span limits applied to free custom ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeLimits {
    /// Under `limitMonth`
    pub limit_month_days: i64,
    /// Without a limit mode. Kept separate from `limit_month_days`: the two
    /// bounds are not the same number and must stay that way until product
    /// decides otherwise.
    pub custom_max_days: i64,
}

impl Default for RangeLimits {
    fn default() -> Self {
        Self {
            limit_month_days: 30,
            custom_max_days: 31,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RangeNormalizer {
    calendar_type: CalendarType,
    limit_calendar: LimitCalendar,
    window: LookbackWindow,
    limits: RangeLimits,
    display_format: String,
}

impl RangeNormalizer {
    pub fn new(
        calendar_type: CalendarType,
        limit_calendar: LimitCalendar,
        window: LookbackWindow,
        limits: RangeLimits,
        display_format: impl Into<String>,
    ) -> Self {
        Self {
            calendar_type,
            limit_calendar,
            window,
            limits,
            display_format: display_format.into(),
        }
    }

    pub fn from_config(
        config: &DashboardConfig,
        calendar_type: CalendarType,
        limit_calendar: LimitCalendar,
        today: NaiveDate,
    ) -> Self {
        Self::new(
            calendar_type,
            limit_calendar,
            LookbackWindow::new(today, config.lookback_days),
            RangeLimits {
                limit_month_days: config.limit_month_days,
                custom_max_days: config.custom_max_days,
            },
            config.display_format.clone(),
        )
    }

    pub fn display_format(&self) -> &str {
        &self.display_format
    }

    pub fn set_window(&mut self, window: LookbackWindow) {
        self.window = window;
    }

    /// Whether `selection` should be committed now. Week and month calendars
    /// commit on the anchoring click and ignore the second one; free ranges
    /// commit once both ends exist.
    pub fn is_ready(&self, selection: &Selection) -> bool {
        matches!(
            (self.calendar_type, selection),
            (CalendarType::Free, Selection::Complete { .. })
                | (CalendarType::Week | CalendarType::Month, Selection::StartOnly { .. })
        )
    }

    pub fn preset(&self, kind: RangeType, now: NaiveDateTime) -> DateRange {
        preset_range(kind, now, &self.display_format)
    }

    /// Builds the committed range for `selection`, merging in the picker
    /// times. The clock time carried by the clicked values is never used.
    pub fn normalize(
        &self,
        selection: &Selection,
        from_time: TimeOfDay,
        to_time: TimeOfDay,
    ) -> Result<DateRange, Rejection> {
        let anchor = selection.start().ok_or(Rejection::NothingSelected)?.date();
        self.check_window(anchor)?;

        let (from, to) = match self.calendar_type {
            CalendarType::Week => self.fixed_span(anchor, from_time, WEEK_SPAN_DAYS),
            CalendarType::Month => self.fixed_span(anchor, from_time, MONTH_SPAN_DAYS),
            CalendarType::Free => match selection.end() {
                None => {
                    let from = anchor.and_time(from_time.to_naive_time());
                    (from, from)
                }
                Some(end) => {
                    let end = end.date();
                    self.check_window(end)?;

                    let (earlier, later) = if end < anchor { (end, anchor) } else { (anchor, end) };
                    let from = earlier.and_time(from_time.to_naive_time());
                    let to = later.and_time(to_time.to_naive_end_time());
                    self.check_span(from, to)?;
                    (from, to)
                }
            },
        };

        Ok(DateRange::with_display_format(from, to, RangeType::Custom, &self.display_format))
    }

    fn fixed_span(&self, anchor: NaiveDate, from_time: TimeOfDay, days: i64) -> (NaiveDateTime, NaiveDateTime) {
        (
            anchor.and_time(from_time.to_naive_time()),
            end_of_day(anchor + Duration::days(days)),
        )
    }

    fn check_window(&self, date: NaiveDate) -> Result<(), Rejection> {
        if self.window.contains(date) {
            Ok(())
        } else {
            Err(Rejection::OutsideLookback {
                date,
                earliest: self.window.earliest(),
                latest: self.window.today(),
            })
        }
    }

    fn check_span(&self, from: NaiveDateTime, to: NaiveDateTime) -> Result<(), Rejection> {
        let max = match self.limit_calendar {
            LimitCalendar::LimitMonth => self.limits.limit_month_days,
            LimitCalendar::None => self.limits.custom_max_days,
        };
        let days = (to - from).num_days().abs();
        if days > max {
            return Err(Rejection::ExceedsLimit { days, max });
        }
        Ok(())
    }
}
