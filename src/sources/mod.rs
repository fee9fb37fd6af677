//! Report sources: the fetch functions report screens pull their data from

mod fixture;
mod http;
#[cfg(test)]
pub(crate) mod testing;

pub use fixture::FixtureReportSource;
pub use http::HttpReportSource;

use crate::types::{DateRange, Identity};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Filters every report endpoint accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilters {
    pub tenant_id: String,
    pub subtenant_id: String,
    pub company_id: String,
    pub department_id: String,
    /// `fromDate` of the effective range
    pub from_time: String,
    /// `toDate` of the effective range
    pub to_time: String,
    /// Report-specific extras (paging, agent filters, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ReportFilters {
    pub fn new(identity: &Identity, range: &DateRange) -> Self {
        Self {
            tenant_id: identity.tenant_id.clone(),
            subtenant_id: identity.sub_tenant_id.clone(),
            company_id: identity.company_id.clone(),
            department_id: identity.department_id.clone(),
            from_time: range.from_date().to_string(),
            to_time: range.to_date().to_string(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_extra(mut self, extra: serde_json::Map<String, serde_json::Value>) -> Self {
        self.extra = extra;
        self
    }
}

/// Body returned by a report endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportResponse {
    /// HTTP-style status code
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn default_status() -> u16 {
    200
}

impl ReportResponse {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            status: 200,
            data,
            message: None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status >= 400
    }

    /// `null`, `[]`, `{}`, or an object whose record list is empty. The record
    /// list is the first of `records`, `data`, `rows` present.
    pub fn is_empty(&self) -> bool {
        match &self.data {
            serde_json::Value::Null => true,
            serde_json::Value::Array(items) => items.is_empty(),
            serde_json::Value::Object(map) => {
                if map.is_empty() {
                    return true;
                }
                match ["records", "data", "rows"].iter().find_map(|k| map.get(*k)) {
                    Some(serde_json::Value::Array(list)) => list.is_empty(),
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("report API returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A fetch function for one report
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Report identifier, also the endpoint path segment
    fn name(&self) -> &str;

    async fn fetch(&self, filters: &ReportFilters) -> Result<ReportResponse, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RangeType;
    use chrono::NaiveDate;
    use serde_json::json;

    fn identity() -> Identity {
        Identity {
            tenant_id: "t1".into(),
            sub_tenant_id: "st1".into(),
            company_id: "c1".into(),
            department_id: "d1".into(),
        }
    }

    #[test]
    fn test_filters_serialize_camel_case_with_extras() {
        let d = NaiveDate::from_ymd_opt(2026, 1, 8).unwrap();
        let range = DateRange::new(
            d.and_hms_opt(0, 0, 0).unwrap(),
            d.and_hms_opt(23, 59, 59).unwrap(),
            RangeType::Today,
        );
        let mut extra = serde_json::Map::new();
        extra.insert("page".into(), json!(2));

        let value = serde_json::to_value(ReportFilters::new(&identity(), &range).with_extra(extra)).unwrap();
        assert_eq!(value["subtenantId"], "st1");
        assert_eq!(value["departmentId"], "d1");
        assert_eq!(value["fromTime"], "2026-01-08T00:00:00");
        assert_eq!(value["toTime"], "2026-01-08T23:59:59");
        assert_eq!(value["page"], 2);
    }

    #[test]
    fn test_response_emptiness() {
        assert!(ReportResponse::ok(json!(null)).is_empty());
        assert!(ReportResponse::ok(json!([])).is_empty());
        assert!(ReportResponse::ok(json!({})).is_empty());
        assert!(ReportResponse::ok(json!({"records": [], "total": 0})).is_empty());
        assert!(!ReportResponse::ok(json!({"records": [{"calls": 3}]})).is_empty());
        assert!(!ReportResponse::ok(json!([1])).is_empty());
        assert!(!ReportResponse::ok(json!({"summary": {"calls": 0}})).is_empty());
        assert!(!ReportResponse::ok(json!({"records": [{"calls": 3}], "rows": []})).is_empty());
        assert!(ReportResponse::ok(json!({"data": [], "rows": [{"calls": 1}]})).is_empty());
    }

    #[test]
    fn test_response_defaults_and_failure_status() {
        let parsed: ReportResponse = serde_json::from_str(r#"{"data": [1, 2]}"#).unwrap();
        assert_eq!(parsed.status, 200);
        assert!(!parsed.is_failure());

        let failed: ReportResponse = serde_json::from_str(r#"{"status": 500, "message": "boom"}"#).unwrap();
        assert!(failed.is_failure());
        assert_eq!(failed.data, serde_json::Value::Null);
    }
}
