//! Custom range widget: the calendar selection state machine and the two
//! time-of-day pickers that sit next to it.

use crate::config::DashboardConfig;
use crate::types::{DateRange, TimeOfDay};
use crate::utils::time::{month_end, month_start, week_start, LookbackWindow};
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Calendar selection state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selection {
    /// Nothing chosen yet
    #[default]
    Empty,
    /// First click made, waiting for the second
    StartOnly { start: NaiveDateTime },
    /// Both clicks made. `end` may be earlier than `start`.
    Complete { start: NaiveDateTime, end: NaiveDateTime },
}

impl Selection {
    pub fn start(&self) -> Option<NaiveDateTime> {
        match self {
            Selection::Empty => None,
            Selection::StartOnly { start } | Selection::Complete { start, .. } => Some(*start),
        }
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        match self {
            Selection::Complete { end, .. } => Some(*end),
            _ => None,
        }
    }

    /// Next state after a click on `at`
    fn advance(self, at: NaiveDateTime) -> Selection {
        match self {
            Selection::Empty | Selection::Complete { .. } => Selection::StartOnly { start: at },
            Selection::StartOnly { start } => Selection::Complete { start, end: at },
        }
    }

    /// Selected calendar days in chronological order
    fn day_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            Selection::Empty => None,
            Selection::StartOnly { start } => Some((start.date(), start.date())),
            Selection::Complete { start, end } => {
                let (a, b) = (start.date(), end.date());
                Some((a.min(b), a.max(b)))
            }
        }
    }
}

/// One day of the rendered month grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    /// Outside the lookback window; clicks are ignored
    pub disabled: bool,
    /// A clicked endpoint
    pub selected: bool,
    /// Between (or on) the selected endpoints
    pub in_range: bool,
    pub today: bool,
}

#[derive(Debug, Clone)]
pub struct RangeWidget {
    window: LookbackWindow,
    visible_month: NaiveDate,
    selection: Selection,
    from_time: TimeOfDay,
    to_time: TimeOfDay,
}

impl RangeWidget {
    pub fn new(window: LookbackWindow, from_time: TimeOfDay, to_time: TimeOfDay) -> Self {
        Self {
            window,
            visible_month: month_start(window.today()),
            selection: Selection::Empty,
            from_time,
            to_time,
        }
    }

    pub fn from_config(config: &DashboardConfig, today: NaiveDate) -> Self {
        Self::new(
            LookbackWindow::new(today, config.lookback_days),
            config.default_from_time,
            config.default_to_time,
        )
    }

    /// Moves the window forward when the day rolls over; selection is kept
    pub fn set_window(&mut self, window: LookbackWindow) {
        self.window = window;
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn is_disabled(&self, date: NaiveDate) -> bool {
        !self.window.contains(date)
    }

    /// Applies a click. Returns `false` (and leaves the state alone) when the
    /// day is disabled.
    pub fn click(&mut self, at: NaiveDateTime) -> bool {
        if self.is_disabled(at.date()) {
            tracing::debug!(date = %at.date(), "ignoring click on disabled day");
            return false;
        }
        self.selection = self.selection.advance(at);
        true
    }

    /// Shows a previously committed range as a completed selection, e.g. when
    /// a screen is re-entered with its last `dateInput`.
    pub fn hydrate(&mut self, range: &DateRange) {
        self.selection = Selection::Complete {
            start: range.from_date_raw(),
            end: range.to_date_raw(),
        };
        self.visible_month = month_start(range.from_date_raw().date());
    }

    pub fn from_time(&self) -> TimeOfDay {
        self.from_time
    }

    pub fn to_time(&self) -> TimeOfDay {
        self.to_time
    }

    pub fn set_from_time(&mut self, time: TimeOfDay) {
        self.from_time = time;
    }

    pub fn set_to_time(&mut self, time: TimeOfDay) {
        self.to_time = time;
    }

    /// First day of the month currently on screen
    pub fn visible_month(&self) -> NaiveDate {
        self.visible_month
    }

    pub fn show_month(&mut self, date: NaiveDate) {
        self.visible_month = month_start(date);
    }

    pub fn previous_month(&mut self) {
        self.visible_month = month_start(self.visible_month - Duration::days(1));
    }

    pub fn next_month(&mut self) {
        self.visible_month = month_end(self.visible_month) + Duration::days(1);
    }

    /// Sunday-first weeks covering the visible month. Days belonging to the
    /// neighbouring months are `None`.
    pub fn month_grid(&self) -> Vec<[Option<DayCell>; 7]> {
        let first = self.visible_month;
        let last = month_end(first);
        let bounds = self.selection.day_bounds();
        let endpoints = [self.selection.start(), self.selection.end()];

        let mut weeks = Vec::new();
        let mut cursor = week_start(first);
        while cursor <= last {
            let mut week = [None; 7];
            for slot in week.iter_mut() {
                if cursor >= first && cursor <= last {
                    *slot = Some(DayCell {
                        date: cursor,
                        disabled: self.is_disabled(cursor),
                        selected: endpoints.iter().flatten().any(|e| e.date() == cursor),
                        in_range: bounds.map(|(a, b)| cursor >= a && cursor <= b).unwrap_or(false),
                        today: cursor == self.window.today(),
                    });
                }
                cursor += Duration::days(1);
            }
            weeks.push(week);
        }
        weeks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, 0, 0).unwrap()
    }

    fn widget() -> RangeWidget {
        RangeWidget::new(
            LookbackWindow::new(date(2026, 10, 16), 90),
            TimeOfDay::START_OF_DAY,
            TimeOfDay::END_OF_DAY,
        )
    }

    #[test]
    fn test_click_sequence_walks_the_state_machine() {
        let mut w = widget();
        assert_eq!(w.selection(), Selection::Empty);

        assert!(w.click(at(2026, 10, 10, 9)));
        assert_eq!(w.selection(), Selection::StartOnly { start: at(2026, 10, 10, 9) });

        // second click earlier than the first is kept as-is
        assert!(w.click(at(2026, 10, 8, 17)));
        assert_eq!(
            w.selection(),
            Selection::Complete { start: at(2026, 10, 10, 9), end: at(2026, 10, 8, 17) }
        );

        // a third click starts over
        assert!(w.click(at(2026, 10, 1, 12)));
        assert_eq!(w.selection(), Selection::StartOnly { start: at(2026, 10, 1, 12) });
    }

    #[test]
    fn test_disabled_days_ignore_clicks() {
        let mut w = widget();
        assert!(w.is_disabled(date(2026, 10, 17)));
        assert!(w.is_disabled(date(2026, 7, 17)));
        assert!(!w.is_disabled(date(2026, 7, 18)));

        assert!(!w.click(at(2026, 10, 17, 9)));
        assert_eq!(w.selection(), Selection::Empty);

        w.click(at(2026, 10, 1, 9));
        assert!(!w.click(at(2026, 6, 1, 9)));
        assert_eq!(w.selection(), Selection::StartOnly { start: at(2026, 10, 1, 9) });
    }

    #[test]
    fn test_month_navigation_keeps_selection() {
        let mut w = widget();
        w.click(at(2026, 10, 3, 9));
        assert_eq!(w.visible_month(), date(2026, 10, 1));

        w.previous_month();
        assert_eq!(w.visible_month(), date(2026, 9, 1));
        w.next_month();
        w.next_month();
        assert_eq!(w.visible_month(), date(2026, 11, 1));
        w.show_month(date(2027, 1, 20));
        assert_eq!(w.visible_month(), date(2027, 1, 1));

        assert_eq!(w.selection(), Selection::StartOnly { start: at(2026, 10, 3, 9) });
    }

    #[test]
    fn test_time_pickers_are_independent() {
        let mut w = widget();
        w.click(at(2026, 10, 3, 9));
        w.set_from_time("08:15".parse().unwrap());
        w.set_to_time("18:45".parse().unwrap());
        assert_eq!(w.from_time().to_string(), "08:15");
        assert_eq!(w.to_time().to_string(), "18:45");
        assert_eq!(w.selection(), Selection::StartOnly { start: at(2026, 10, 3, 9) });
    }

    #[test]
    fn test_month_grid_flags() {
        let mut w = widget();
        w.click(at(2026, 10, 12, 9));
        w.click(at(2026, 10, 9, 9));

        let grid = w.month_grid();
        // October 2026 starts on a Thursday and spans five Sunday-first weeks
        assert_eq!(grid.len(), 5);
        assert!(grid[0][0].is_none());
        assert_eq!(grid[0][4].unwrap().date, date(2026, 10, 1));

        let cells: Vec<DayCell> = grid.iter().flatten().flatten().copied().collect();
        assert_eq!(cells.len(), 31);

        let find = |d: u32| cells.iter().find(|c| c.date == date(2026, 10, d)).copied().unwrap();
        assert!(find(9).selected && find(9).in_range);
        assert!(!find(10).selected && find(10).in_range);
        assert!(find(12).selected);
        assert!(!find(13).in_range);
        assert!(find(16).today);
        assert!(find(17).disabled);
        assert!(!find(16).disabled);
    }

    #[test]
    fn test_hydrate_from_committed_range() {
        let mut w = widget();
        let range = DateRange::new(at(2026, 9, 2, 0), at(2026, 9, 5, 0), crate::types::RangeType::Custom);
        w.hydrate(&range);
        assert_eq!(w.selection().start(), Some(at(2026, 9, 2, 0)));
        assert_eq!(w.selection().end(), Some(at(2026, 9, 5, 0)));
        assert_eq!(w.visible_month(), date(2026, 9, 1));
    }
}
