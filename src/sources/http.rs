//! HTTP report source
//! POSTs the filters as JSON to `{base_url}/{report}`

use super::{FetchError, ReportFilters, ReportResponse, ReportSource};
use crate::config::ApiConfig;
use async_trait::async_trait;
use std::time::Duration;

pub struct HttpReportSource {
    name: String,
    url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpReportSource {
    pub fn new(report: &str, api: &ApiConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .user_agent(concat!("callrange/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            name: report.to_string(),
            url: format!("{}/{}", api.base_url.trim_end_matches('/'), report),
            token: api.token.clone(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ReportSource for HttpReportSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, filters: &ReportFilters) -> Result<ReportResponse, FetchError> {
        let mut request = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .json(filters);

        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let mut message: String = body.chars().take(200).collect();
            if message.is_empty() {
                message = status.canonical_reason().unwrap_or("unknown error").to_string();
            }
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
