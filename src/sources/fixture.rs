//! Fixture report source
//! Serves records from a local JSON file, filtered to the requested range and
//! department. Accepts a bare array or an object with a `records` array.

use super::{FetchError, ReportFilters, ReportResponse, ReportSource};
use crate::types::DATE_TIME_FORMAT;
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

pub struct FixtureReportSource {
    name: String,
    path: PathBuf,
    timestamp_field: String,
}

impl FixtureReportSource {
    pub fn new(name: &str, path: &Path) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            timestamp_field: "timestamp".to_string(),
        }
    }

    pub fn with_timestamp_field(mut self, field: &str) -> Self {
        self.timestamp_field = field.to_string();
        self
    }

    fn parse_timestamp(value: &Value) -> Option<NaiveDateTime> {
        let s = value.as_str()?;
        NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT)
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Local).naive_local())
            })
    }

    fn matches(&self, record: &Value, from: NaiveDateTime, to: NaiveDateTime, department: &str) -> bool {
        let in_range = record
            .get(&self.timestamp_field)
            .and_then(Self::parse_timestamp)
            .map(|t| t >= from && t <= to)
            .unwrap_or(false);

        // records without a department belong to every department
        let same_department = match record.get("departmentId").and_then(Value::as_str) {
            Some(d) => d == department,
            None => true,
        };

        in_range && same_department
    }
}

#[async_trait]
impl ReportSource for FixtureReportSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, filters: &ReportFilters) -> Result<ReportResponse, FetchError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| FetchError::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        let parsed: Value = serde_json::from_str(&content)?;

        let records = match parsed {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("records") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        let from = NaiveDateTime::parse_from_str(&filters.from_time, DATE_TIME_FORMAT)
            .map_err(|e| FetchError::Status { status: 400, message: format!("bad fromTime: {}", e) })?;
        let to = NaiveDateTime::parse_from_str(&filters.to_time, DATE_TIME_FORMAT)
            .map_err(|e| FetchError::Status { status: 400, message: format!("bad toTime: {}", e) })?;

        let selected: Vec<Value> = records
            .into_iter()
            .filter(|r| self.matches(r, from, to, &filters.department_id))
            .collect();

        Ok(ReportResponse::ok(json!({
            "total": selected.len(),
            "records": selected,
        })))
    }
}
