//! Client configuration
//!
//! Loaded from `DASHBOARD_*` environment variables with defaults matching a
//! local backend.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::query_string::ArrayFormat;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_APP_VERSION: &str = "1";
pub const DEFAULT_STORAGE_DIR: &str = ".dashboard";

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not a valid URL: {source}")]
    InvalidUrl {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("{name} must be an absolute http(s) URL, got {value}")]
    UnsupportedScheme { name: &'static str, value: String },

    #[error("{name} must be a positive number of milliseconds, got {value:?}")]
    InvalidDuration { name: &'static str, value: String },

    #[error("{name} has an unsupported value {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// Settings shared by every outbound request
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL; descriptor paths are appended to it
    pub base_url: Url,
    /// Budget for ordinary requests
    pub timeout: Duration,
    /// Budget for the token refresh call
    pub refresh_timeout: Duration,
    /// Value of the `App-Version` header
    pub app_version: String,
    /// Directory for durable client state
    pub storage_dir: PathBuf,
    /// List style used when encoding query strings
    pub array_format: ArrayFormat,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            // constant literal always parses
            base_url: Url::parse(DEFAULT_API_URL).unwrap_or_else(|_| unreachable!()),
            timeout: DEFAULT_TIMEOUT,
            refresh_timeout: DEFAULT_TIMEOUT,
            app_version: DEFAULT_APP_VERSION.to_string(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            array_format: ArrayFormat::default(),
        }
    }
}

impl ClientConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(value) = get("DASHBOARD_API_URL") {
            config.base_url = parse_base_url("DASHBOARD_API_URL", &value)?;
        }
        if let Some(value) = get("DASHBOARD_TIMEOUT_MS") {
            config.timeout = parse_millis("DASHBOARD_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = get("DASHBOARD_REFRESH_TIMEOUT_MS") {
            config.refresh_timeout = parse_millis("DASHBOARD_REFRESH_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = get("DASHBOARD_APP_VERSION") {
            config.app_version = value.trim().to_string();
        }
        if let Some(value) = get("DASHBOARD_STORAGE_DIR") {
            config.storage_dir = PathBuf::from(value);
        }
        if let Some(value) = get("DASHBOARD_ARRAY_FORMAT") {
            config.array_format =
                ArrayFormat::parse(&value).ok_or(ConfigError::InvalidValue {
                    name: "DASHBOARD_ARRAY_FORMAT",
                    value,
                })?;
        }

        Ok(config)
    }

    /// Resolve a descriptor URL against the base URL
    ///
    /// Absolute URLs pass through. Relative paths are appended to the base
    /// path, so a base of `https://api.example.com/v1` and a path of
    /// `/analytics/summary` yield `https://api.example.com/v1/analytics/summary`.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path);
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
    }
}

fn parse_base_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|source| ConfigError::InvalidUrl { name, source })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::UnsupportedScheme {
            name,
            value: value.to_string(),
        }),
    }
}

fn parse_millis(name: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::InvalidDuration {
            name,
            value: value.to_string(),
        }),
    }
}
