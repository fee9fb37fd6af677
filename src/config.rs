//! Dashboard configuration loading and validation.
//!
//! Every component that needs a tunable (lookback length, debounce quiet
//! period, range limits, picker defaults) receives a [`DashboardConfig`]
//! explicitly. Values come from a TOML file with environment overrides for the
//! report API endpoint and token.

use crate::types::TimeOfDay;
use crate::utils::paths;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Upper bound for every day-count setting (ten years)
pub const MAX_DAYS: i64 = 3650;

/// Report API endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL; each report is fetched from `{base_url}/{report}`
    pub base_url: String,
    /// Bearer token, usually supplied via `CALLRANGE_API_TOKEN`
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/reports".into(),
            token: None,
            timeout_secs: 30,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Days before today that remain selectable (default 90)
    pub lookback_days: i64,
    /// Quiet period before a range change turns into a fetch (default 300 ms)
    pub debounce_ms: u64,
    /// Max whole-day span under `limitMonth` (default 30)
    pub limit_month_days: i64,
    /// Max whole-day span for unlimited custom ranges (default 31)
    pub custom_max_days: i64,
    /// Initial value of the "from" time picker (default 00:00)
    pub default_from_time: TimeOfDay,
    /// Initial value of the "to" time picker (default 23:59)
    pub default_to_time: TimeOfDay,
    /// strftime pattern for `fromDisplay`/`toDisplay` (default `%b %-d`)
    pub display_format: String,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            lookback_days: 90,
            debounce_ms: 300,
            limit_month_days: 30,
            custom_max_days: 31,
            default_from_time: TimeOfDay::START_OF_DAY,
            default_to_time: TimeOfDay::END_OF_DAY,
            display_format: crate::types::DEFAULT_DISPLAY_FORMAT.into(),
            api: ApiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl DashboardConfig {
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_toml(&content)
    }

    /// Loads `path` if given, otherwise the per-user config file if it exists,
    /// otherwise defaults. Environment overrides apply in every case.
    pub fn resolve(path: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let source = match path {
            Some(p) => Some(p.to_path_buf()),
            None => paths::config_file().filter(|p| p.exists()),
        };

        let mut config = match source {
            Some(ref p) => Self::load(p)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok((config, source))
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("CALLRANGE_API_URL") {
            if !url.trim().is_empty() {
                self.api.base_url = url;
            }
        }
        if let Ok(token) = std::env::var("CALLRANGE_API_TOKEN") {
            if !token.trim().is_empty() {
                self.api.token = Some(token);
            }
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, days) in [
            ("lookback_days", self.lookback_days),
            ("limit_month_days", self.limit_month_days),
            ("custom_max_days", self.custom_max_days),
        ] {
            if !(0..=MAX_DAYS).contains(&days) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be between 0 and {} days, got {}", MAX_DAYS, days),
                });
            }
        }
        if self.display_format.is_empty()
            || StrftimeItems::new(&self.display_format).any(|item| matches!(item, Item::Error))
        {
            return Err(ConfigError::InvalidValue {
                field: "display_format",
                reason: format!("not a valid strftime pattern: {:?}", self.display_format),
            });
        }
        if self.api.base_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api.base_url",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}
