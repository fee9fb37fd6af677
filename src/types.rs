//! Core types for callrange

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wire format for `fromDate` / `toDate`: local time, second precision, no offset
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Default calendar-day format for `fromDisplay` / `toDisplay`
pub const DEFAULT_DISPLAY_FORMAT: &str = "%b %-d";

/// How a committed range was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeType {
    #[serde(rename = "Today")]
    Today,
    #[serde(rename = "This Week")]
    ThisWeek,
    #[serde(rename = "Last Week")]
    LastWeek,
    #[serde(rename = "This Month")]
    ThisMonth,
    #[serde(rename = "Last Month")]
    LastMonth,
    #[serde(rename = "Custom")]
    Custom,
}

impl RangeType {
    /// Every preset, in the order the preset menu lists them
    pub const ALL: [RangeType; 6] = [
        RangeType::Today,
        RangeType::ThisWeek,
        RangeType::LastWeek,
        RangeType::ThisMonth,
        RangeType::LastMonth,
        RangeType::Custom,
    ];
}

impl fmt::Display for RangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeType::Today => write!(f, "Today"),
            RangeType::ThisWeek => write!(f, "This Week"),
            RangeType::LastWeek => write!(f, "Last Week"),
            RangeType::ThisMonth => write!(f, "This Month"),
            RangeType::LastMonth => write!(f, "Last Month"),
            RangeType::Custom => write!(f, "Custom"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown range preset: {0}")]
pub struct ParseRangeTypeError(String);

impl FromStr for RangeType {
    type Err = ParseRangeTypeError;

    /// Accepts display names ("This Week") as well as CLI spellings ("this-week", "this_week")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "today" => Ok(RangeType::Today),
            "thisweek" => Ok(RangeType::ThisWeek),
            "lastweek" => Ok(RangeType::LastWeek),
            "thismonth" => Ok(RangeType::ThisMonth),
            "lastmonth" => Ok(RangeType::LastMonth),
            "custom" => Ok(RangeType::Custom),
            _ => Err(ParseRangeTypeError(s.to_string())),
        }
    }
}

/// Shape a screen forces on its ranges
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum CalendarType {
    /// Free custom range, two clicks
    #[default]
    #[serde(rename = "")]
    #[value(name = "free")]
    Free,
    /// One click anchors a 7-day range
    #[serde(rename = "week")]
    Week,
    /// One click anchors a 31-day range
    #[serde(rename = "month")]
    Month,
}

/// Optional range-length limit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitCalendar {
    #[default]
    #[serde(rename = "")]
    None,
    #[serde(rename = "limitMonth")]
    LimitMonth,
}

/// An `hour:minute` value held by the from/to time pickers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    pub const START_OF_DAY: TimeOfDay = TimeOfDay { hour: 0, minute: 0 };
    pub const END_OF_DAY: TimeOfDay = TimeOfDay { hour: 23, minute: 59 };

    pub fn new(hour: u32, minute: u32) -> Result<Self, ParseTimeError> {
        if hour > 23 || minute > 59 {
            return Err(ParseTimeError::OutOfRange { hour, minute });
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// Start of the picked minute
    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }

    /// Time for the closing bound of a range. The picker has no seconds
    /// column, so "23:59" means 23:59:59 and a full day stays inclusive.
    pub fn to_naive_end_time(self) -> NaiveTime {
        let second = if self == Self::END_OF_DAY { 59 } else { 0 };
        NaiveTime::from_hms_opt(self.hour, self.minute, second).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseTimeError {
    #[error("invalid time of day {0:?} (expected HH:MM)")]
    InvalidFormat(String),
    #[error("time of day out of range: {hour:02}:{minute:02}")]
    OutOfRange { hour: u32, minute: u32 },
}

impl FromStr for TimeOfDay {
    type Err = ParseTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| ParseTimeError::InvalidFormat(s.to_string()))?;
        let hour = h.parse::<u32>().map_err(|_| ParseTimeError::InvalidFormat(s.to_string()))?;
        let minute = m.parse::<u32>().map_err(|_| ParseTimeError::InvalidFormat(s.to_string()))?;
        Self::new(hour, minute)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// `{ start, end }` mirror of a range's raw values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedRangeValue {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// A committed from/to selection plus display and typing metadata.
///
/// Immutable once built; a new selection replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "DateRangeInput")]
pub struct DateRange {
    from_date: String,
    to_date: String,
    from_date_raw: NaiveDateTime,
    to_date_raw: NaiveDateTime,
    #[serde(rename = "type")]
    range_type: RangeType,
    from_display: String,
    to_display: String,
    range_display: String,
    selected_range_value: SelectedRangeValue,
}

impl DateRange {
    pub fn new(from: NaiveDateTime, to: NaiveDateTime, range_type: RangeType) -> Self {
        Self::with_display_format(from, to, range_type, DEFAULT_DISPLAY_FORMAT)
    }

    /// Builds a range, swapping the bounds if they arrive reversed.
    /// `display_format` must be a valid strftime pattern.
    pub fn with_display_format(
        from: NaiveDateTime,
        to: NaiveDateTime,
        range_type: RangeType,
        display_format: &str,
    ) -> Self {
        let (from, to) = if from <= to { (from, to) } else { (to, from) };

        let from_display = from.format(display_format).to_string();
        let to_display = to.format(display_format).to_string();
        let range_display = if from_display == to_display {
            from_display.clone()
        } else {
            format!("{} - {}", from_display, to_display)
        };

        Self {
            from_date: from.format(DATE_TIME_FORMAT).to_string(),
            to_date: to.format(DATE_TIME_FORMAT).to_string(),
            from_date_raw: from,
            to_date_raw: to,
            range_type,
            from_display,
            to_display,
            range_display,
            selected_range_value: SelectedRangeValue { start: from, end: to },
        }
    }

    pub fn from_date(&self) -> &str {
        &self.from_date
    }

    pub fn to_date(&self) -> &str {
        &self.to_date
    }

    pub fn from_date_raw(&self) -> NaiveDateTime {
        self.from_date_raw
    }

    pub fn to_date_raw(&self) -> NaiveDateTime {
        self.to_date_raw
    }

    pub fn range_type(&self) -> RangeType {
        self.range_type
    }

    pub fn from_display(&self) -> &str {
        &self.from_display
    }

    pub fn range_display(&self) -> &str {
        &self.range_display
    }

    pub fn selected_range_value(&self) -> SelectedRangeValue {
        self.selected_range_value
    }
}

/// Re-hydration payload: only the raw bounds and type are trusted,
/// everything else is derived again.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DateRangeInput {
    from_date_raw: NaiveDateTime,
    to_date_raw: NaiveDateTime,
    #[serde(rename = "type")]
    range_type: RangeType,
}

impl From<DateRangeInput> for DateRange {
    fn from(input: DateRangeInput) -> Self {
        DateRange::new(input.from_date_raw, input.to_date_raw, input.range_type)
    }
}

/// Selected project, as supplied by the tenant/project picker
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub tenant_id: String,
    pub sub_tenant_id: String,
    pub company_id: String,
    pub department_id: String,
}

/// What makes two fetches redundant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchKey {
    pub department_id: String,
    pub from_date: String,
    pub to_date: String,
}

impl FetchKey {
    pub fn new(identity: &Identity, range: &DateRange) -> Self {
        Self {
            department_id: identity.department_id.clone(),
            from_date: range.from_date().to_string(),
            to_date: range.to_date().to_string(),
        }
    }
}

impl fmt::Display for FetchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}..{}", self.department_id, self.from_date, self.to_date)
    }
}

/// Outcome of the most recent fetch on a screen
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FetchState {
    #[default]
    Idle,
    Loading { key: FetchKey },
    Success { key: FetchKey, data: serde_json::Value },
    /// Fetch succeeded but returned no records
    Empty { key: FetchKey },
    /// Fetch failed; `message` is the generic text shown to the user
    Error { key: FetchKey, message: String },
}

impl FetchState {
    pub fn key(&self) -> Option<&FetchKey> {
        match self {
            FetchState::Idle => None,
            FetchState::Loading { key }
            | FetchState::Success { key, .. }
            | FetchState::Empty { key }
            | FetchState::Error { key, .. } => Some(key),
        }
    }

    /// True once a fetch has resolved one way or another
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            FetchState::Success { .. } | FetchState::Empty { .. } | FetchState::Error { .. }
        )
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FetchState::Error { .. })
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchState::Idle => write!(f, "Idle"),
            FetchState::Loading { .. } => write!(f, "Loading"),
            FetchState::Success { .. } => write!(f, "Success"),
            FetchState::Empty { .. } => write!(f, "No Records"),
            FetchState::Error { .. } => write!(f, "Error"),
        }
    }
}

/// CLI output format
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, s).unwrap()
    }

    #[test]
    fn test_reversed_bounds_are_swapped() {
        let range = DateRange::new(at(2026, 1, 10, 0, 0, 0), at(2026, 1, 8, 0, 0, 0), RangeType::Custom);
        assert!(range.from_date_raw() <= range.to_date_raw());
        assert_eq!(range.from_date(), "2026-01-08T00:00:00");
        assert_eq!(range.to_date(), "2026-01-10T00:00:00");
    }

    #[test]
    fn test_range_display_single_day() {
        let range = DateRange::new(at(2026, 3, 4, 0, 0, 0), at(2026, 3, 4, 23, 59, 59), RangeType::Today);
        assert_eq!(range.from_display(), "Mar 4");
        assert_eq!(range.range_display(), "Mar 4");
    }

    #[test]
    fn test_range_display_span() {
        let range = DateRange::new(at(2026, 1, 8, 0, 0, 0), at(2026, 1, 10, 23, 59, 59), RangeType::Custom);
        assert_eq!(range.range_display(), "Jan 8 - Jan 10");
        assert_eq!(range.selected_range_value().start, range.from_date_raw());
        assert_eq!(range.selected_range_value().end, range.to_date_raw());
    }

    #[test]
    fn test_serializes_camel_case_with_type_label() {
        let range = DateRange::new(at(2026, 1, 8, 0, 0, 0), at(2026, 1, 14, 23, 59, 59), RangeType::ThisWeek);
        let json = serde_json::to_value(&range).unwrap();
        assert_eq!(json["type"], "This Week");
        assert_eq!(json["fromDate"], "2026-01-08T00:00:00");
        assert_eq!(json["rangeDisplay"], "Jan 8 - Jan 14");
        assert!(json.get("selectedRangeValue").is_some());
    }

    #[test]
    fn test_deserialize_rebuilds_derived_fields() {
        let payload = serde_json::json!({
            "fromDateRaw": "2026-02-03T00:00:00",
            "toDateRaw": "2026-02-01T23:59:59",
            "type": "Custom",
            "rangeDisplay": "garbage"
        });
        let range: DateRange = serde_json::from_value(payload).unwrap();
        assert_eq!(range.range_display(), "Feb 1 - Feb 3");
        assert_eq!(range.from_date(), "2026-02-01T23:59:59");
    }

    #[test]
    fn test_range_type_parses_cli_spellings() {
        assert_eq!("this-week".parse::<RangeType>().unwrap(), RangeType::ThisWeek);
        assert_eq!("Last Month".parse::<RangeType>().unwrap(), RangeType::LastMonth);
        assert_eq!("TODAY".parse::<RangeType>().unwrap(), RangeType::Today);
        assert!("fortnight".parse::<RangeType>().is_err());
    }

    #[test]
    fn test_time_of_day_parsing() {
        let t: TimeOfDay = "09:30".parse().unwrap();
        assert_eq!((t.hour(), t.minute()), (9, 30));
        assert_eq!(t.to_string(), "09:30");
        assert!("24:00".parse::<TimeOfDay>().is_err());
        assert!("noon".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn test_end_of_day_picker_means_last_second() {
        assert_eq!(TimeOfDay::END_OF_DAY.to_naive_end_time(), NaiveTime::from_hms_opt(23, 59, 59).unwrap());
        assert_eq!(TimeOfDay::END_OF_DAY.to_naive_time(), NaiveTime::from_hms_opt(23, 59, 0).unwrap());
        assert_eq!(TimeOfDay::START_OF_DAY.to_naive_time(), NaiveTime::MIN);
        assert_eq!(TimeOfDay::START_OF_DAY.to_naive_end_time(), NaiveTime::MIN);
    }

    #[test]
    fn test_calendar_type_wire_names() {
        assert_eq!(serde_json::to_string(&CalendarType::Free).unwrap(), "\"\"");
        assert_eq!(serde_json::from_str::<CalendarType>("\"week\"").unwrap(), CalendarType::Week);
        assert_eq!(serde_json::from_str::<LimitCalendar>("\"limitMonth\"").unwrap(), LimitCalendar::LimitMonth);
    }
}
