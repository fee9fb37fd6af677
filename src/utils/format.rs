//! Output formatting utilities

use crate::range::DayCell;
use crate::types::{DateRange, FetchState};
use colored::Colorize;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

/// Table row for a range
#[derive(Tabled)]
pub struct RangeRow {
    #[tabled(rename = "Range")]
    pub label: String,
    #[tabled(rename = "From")]
    pub from: String,
    #[tabled(rename = "To")]
    pub to: String,
    #[tabled(rename = "Display")]
    pub display: String,
}

impl RangeRow {
    pub fn new(label: impl Into<String>, range: &DateRange) -> Self {
        Self {
            label: label.into(),
            from: range.from_date().to_string(),
            to: range.to_date().to_string(),
            display: range.range_display().to_string(),
        }
    }
}

/// Format labelled ranges as a table
pub fn format_ranges(ranges: &[(String, DateRange)]) -> String {
    let rows: Vec<RangeRow> = ranges.iter().map(|(label, range)| RangeRow::new(label.clone(), range)).collect();

    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(0)).with(Alignment::left()))
        .to_string()
}

/// Table row for a report's fetch outcome
#[derive(Tabled)]
pub struct FetchRow {
    #[tabled(rename = "Report")]
    pub report: String,
    #[tabled(rename = "State")]
    pub state: String,
    #[tabled(rename = "Range")]
    pub range: String,
    #[tabled(rename = "Records")]
    pub records: String,
}

/// Get fetch state display string with color
pub fn format_state(state: &FetchState) -> String {
    let label = state.to_string();
    match state {
        FetchState::Success { .. } => label.green().to_string(),
        FetchState::Empty { .. } => label.yellow().to_string(),
        FetchState::Error { .. } => label.red().to_string(),
        FetchState::Idle | FetchState::Loading { .. } => label.dimmed().to_string(),
    }
}

/// Record count of a successful result, `-` otherwise
pub fn record_count(state: &FetchState) -> String {
    match state {
        FetchState::Success { data, .. } => match data {
            serde_json::Value::Array(items) => items.len().to_string(),
            serde_json::Value::Object(map) => map
                .get("total")
                .and_then(|t| t.as_u64())
                .map(|t| t.to_string())
                .or_else(|| {
                    map.get("records")
                        .and_then(|r| r.as_array())
                        .map(|r| r.len().to_string())
                })
                .unwrap_or_else(|| "-".to_string()),
            _ => "-".to_string(),
        },
        FetchState::Empty { .. } => "0".to_string(),
        _ => "-".to_string(),
    }
}

/// Format per-report fetch outcomes as a table
pub fn format_fetch_table(results: &[(String, Option<DateRange>, FetchState)]) -> String {
    let rows: Vec<FetchRow> = results
        .iter()
        .map(|(report, range, state)| FetchRow {
            report: report.clone(),
            state: format_state(state),
            range: range
                .as_ref()
                .map(|r| r.range_display().to_string())
                .unwrap_or_else(|| "-".to_string()),
            records: record_count(state),
        })
        .collect();

    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::single(0)).with(Alignment::left()))
        .to_string()
}

/// Format anything serializable as pretty JSON
pub fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

/// Render a Sunday-first month grid. Disabled days are dimmed, the selection
/// is green and today is bold.
pub fn format_calendar(title: &str, weeks: &[[Option<DayCell>; 7]]) -> String {
    let mut out = format!("{}\n", title.bold());
    out.push_str(&format!("{}\n", " Su  Mo  Tu  We  Th  Fr  Sa".dimmed()));

    for week in weeks {
        let line: Vec<String> = week
            .iter()
            .map(|cell| match cell {
                None => "   ".to_string(),
                Some(cell) => format_day(cell),
            })
            .collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

fn format_day(cell: &DayCell) -> String {
    let text = format!("{:>3}", chrono::Datelike::day(&cell.date));
    let mut styled = if cell.disabled {
        text.dimmed()
    } else if cell.selected {
        text.black().on_green()
    } else if cell.in_range {
        text.green()
    } else {
        text.normal()
    };
    if cell.today {
        styled = styled.bold().underline();
    }
    styled.to_string()
}

/// Print banner
pub fn print_banner() {
    println!();
    println!("{}", "  callrange - Report Date Range Picker".cyan().bold());
    println!();
}
