//! Service endpoints and protocol tuning.

use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

use crate::lookup::DEFAULT_DEBOUNCE_WINDOW_MS;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid config document: {0}")]
    Parse(String),

    #[error("{field} is not an http(s) URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{0} must be positive")]
    NotPositive(&'static str),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

fn default_debounce() -> i64 {
    DEFAULT_DEBOUNCE_WINDOW_MS
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Endpoints and limits for one report session, supplied by the host as
/// camelCase JSON.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    pub catalog_search_url: String,
    pub catalog_detail_url: String,
    pub send_otp_url: String,
    pub check_otp_url: String,
    pub submission_url: String,
    #[serde(default = "default_debounce")]
    pub debounce_window_ms: i64,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

impl ServiceConfig {
    /// Parse and validate a config document.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let urls = [
            ("catalogSearchUrl", &self.catalog_search_url),
            ("catalogDetailUrl", &self.catalog_detail_url),
            ("sendOtpUrl", &self.send_otp_url),
            ("checkOtpUrl", &self.check_otp_url),
            ("submissionUrl", &self.submission_url),
        ];
        for (field, value) in urls {
            let valid = Url::parse(value)
                .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
                .unwrap_or(false);
            if !valid {
                return Err(ConfigError::InvalidUrl {
                    field,
                    value: value.clone(),
                });
            }
        }

        if self.debounce_window_ms <= 0 {
            return Err(ConfigError::NotPositive("debounceWindowMs"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::NotPositive("requestTimeoutSecs"));
        }
        Ok(())
    }
}
