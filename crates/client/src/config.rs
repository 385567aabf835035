//! Client configuration (environment-driven).

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

pub const API_URL_ENV: &str = "IGAKU_API_URL";
pub const TIMEOUT_ENV: &str = "IGAKU_HTTP_TIMEOUT_SECS";
pub const DATA_DIR_ENV: &str = "IGAKU_DATA_DIR";

pub const DEFAULT_API_URL: &str = "http://localhost:4000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid API url '{0}': must be an absolute http(s) url")]
    InvalidApiUrl(String),

    #[error("invalid HTTP timeout '{0}': must be a positive number of seconds")]
    InvalidTimeout(String),

    #[error("failed to resolve a data directory; set {DATA_DIR_ENV}")]
    NoDataDir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    api_url: String,
    timeout: Duration,
    data_dir: PathBuf,
}

impl ClientConfig {
    pub fn new(api_url: &str, data_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: normalize_api_url(api_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            data_dir: data_dir.into(),
        })
    }

    /// Load from `IGAKU_API_URL`, `IGAKU_HTTP_TIMEOUT_SECS` and `IGAKU_DATA_DIR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let timeout = match std::env::var(TIMEOUT_ENV) {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let data_dir = match std::env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_data_dir().ok_or(ConfigError::NoDataDir)?,
        };

        Ok(Self {
            api_url: normalize_api_url(&api_url)?,
            timeout,
            data_dir,
        })
    }

    pub fn with_api_url(mut self, api_url: &str) -> Result<Self, ConfigError> {
        self.api_url = normalize_api_url(api_url)?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Base url without a trailing slash.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Location of the offline snapshot database.
    pub fn cache_db_path(&self) -> PathBuf {
        self.data_dir.join("cache.sqlite")
    }
}

fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    match reqwest::Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            Ok(trimmed.to_string())
        }
        _ => Err(ConfigError::InvalidApiUrl(raw.to_string())),
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}

fn default_data_dir() -> Option<PathBuf> {
    let base = dirs::data_dir().or_else(|| {
        dirs::home_dir().map(|mut h| {
            h.push(".local");
            h.push("share");
            h
        })
    })?;
    Some(base.join("igaku"))
}
