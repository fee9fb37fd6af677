//! Test doubles for report sources

use super::{FetchError, ReportFilters, ReportResponse, ReportSource};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Records every call; optional per-department delay and canned response
pub struct RecordingSource {
    calls: Mutex<Vec<ReportFilters>>,
    slow_department: Option<(String, Duration)>,
    response: Mutex<Result<ReportResponse, u16>>,
}

impl RecordingSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            slow_department: None,
            response: Mutex::new(Ok(ReportResponse::ok(json!({"records": [{"calls": 1}]})))),
        })
    }

    pub fn with_slow(department: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            slow_department: Some((department.to_string(), delay)),
            response: Mutex::new(Ok(ReportResponse::ok(json!([{"calls": 1}])))),
        })
    }

    /// `Err(status)` makes the next fetches fail with that status
    pub fn respond(&self, response: Result<ReportResponse, u16>) {
        *self.response.lock() = response;
    }

    pub fn calls(&self) -> Vec<ReportFilters> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ReportSource for RecordingSource {
    fn name(&self) -> &str {
        "recording"
    }

    async fn fetch(&self, filters: &ReportFilters) -> Result<ReportResponse, FetchError> {
        self.calls.lock().push(filters.clone());
        let delay = self
            .slow_department
            .as_ref()
            .filter(|(dept, _)| *dept == filters.department_id)
            .map(|(_, delay)| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let response = self.response.lock().clone();
        response.map_err(|status| FetchError::Status {
            status,
            message: "down".into(),
        })
    }
}
