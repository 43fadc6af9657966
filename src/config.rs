//! Console configuration from environment variables

use crate::conversation::TransitionPolicy;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1/";
const DEFAULT_REFRESH_SECS: u64 = 10;
const DEFAULT_PAGE_SIZE: u32 = 50;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("INBOX_API_URL must be an http(s) URL, got {0:?}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Base URL of the REST backend, always ending in `/`
    pub api_url: String,
    /// Bearer token issued at login
    pub api_token: Option<String>,
    pub refresh_interval: Duration,
    pub page_size: u32,
    pub transition_policy: TransitionPolicy,
    pub http_timeout: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            page_size: DEFAULT_PAGE_SIZE,
            transition_policy: TransitionPolicy::Permissive,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = match lookup("INBOX_API_URL") {
            Some(url) => normalize_base_url(&url)?,
            None => defaults.api_url,
        };

        let api_token = lookup("INBOX_API_TOKEN").filter(|t| !t.trim().is_empty());

        let refresh_secs = positive_number(&lookup, "INBOX_REFRESH_SECS", DEFAULT_REFRESH_SECS)?;
        let page_size = positive_number(&lookup, "INBOX_PAGE_SIZE", u64::from(DEFAULT_PAGE_SIZE))?;
        let timeout_secs =
            positive_number(&lookup, "INBOX_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;

        let transition_policy = match lookup("INBOX_STRICT_TRANSITIONS").as_deref().map(str::trim) {
            Some("1" | "true" | "yes") => TransitionPolicy::Strict,
            _ => TransitionPolicy::Permissive,
        };

        Ok(Self {
            api_url,
            api_token,
            refresh_interval: Duration::from_secs(refresh_secs),
            page_size: u32::try_from(page_size).map_err(|_| ConfigError::InvalidNumber {
                var: "INBOX_PAGE_SIZE",
                value: page_size.to_string(),
            })?,
            transition_policy,
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn positive_number<F>(lookup: &F, var: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::InvalidNumber { var, value: raw }),
        },
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let url = raw.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::InvalidUrl(raw.to_string()));
    }
    if url.ends_with('/') {
        Ok(url.to_string())
    } else {
        Ok(format!("{url}/"))
    }
}
