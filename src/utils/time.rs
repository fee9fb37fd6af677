//! Time utilities for consistent day boundaries and the selectable lookback window

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

/// The user's wall-clock time. Ranges carry no offset, so everything
/// downstream works on naive local values.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// 23:59:59 on `date`
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(23, 59, 59).unwrap_or_else(|| start_of_day(date))
}

/// Sunday on or before `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last calendar day of `date`'s month
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// Rolling span of selectable days: `today - days ..= today`, inclusive at
/// day granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookbackWindow {
    today: NaiveDate,
    days: i64,
}

impl LookbackWindow {
    pub fn new(today: NaiveDate, days: i64) -> Self {
        Self { today, days: days.max(0) }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Saturates at `NaiveDate::MIN` for windows reaching past the calendar
    pub fn earliest(&self) -> NaiveDate {
        Duration::try_days(self.days)
            .and_then(|span| self.today.checked_sub_signed(span))
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.earliest() && date <= self.today
    }
}
