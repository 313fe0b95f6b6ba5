//! CMS and admin API configuration from environment variables.
//!
//! `BUILDER_API_KEY` is required; everything else has a default.

use crate::errors::{Error, Result};
use std::time::Duration;

const DEFAULT_CONTENT_URL: &str = "https://cdn.builder.io/api/v3/content";
const DEFAULT_ADMIN_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Settings for both the public CMS content API and the admin mutation API.
#[derive(Debug, Clone)]
pub struct CmsConfig {
    /// Public API key sent as the `apiKey` query parameter
    pub api_key: String,
    /// Base URL of the content API, without the model segment
    pub content_url: String,
    /// Base URL of the site hosting `/api/admin/content`
    pub admin_url: String,
    /// Bearer token for admin mutations, if any
    pub admin_token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl CmsConfig {
    /// Builds a config with defaults for everything except the API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            content_url: DEFAULT_CONTENT_URL.to_string(),
            admin_url: DEFAULT_ADMIN_URL.to_string(),
            admin_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Reads `BUILDER_API_KEY`, `BUILDER_API_URL`, `ADMIN_API_URL`,
    /// `ADMIN_API_TOKEN` and `CMS_TIMEOUT_SECS`.
    ///
    /// # Errors
    /// Returns an error if the API key is missing or the timeout is not a
    /// positive integer.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("BUILDER_API_KEY").map_err(|e| Error::Config {
            message: format!("BUILDER_API_KEY not set: {e}"),
        })?;

        let timeout_secs = match std::env::var("CMS_TIMEOUT_SECS") {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key,
            content_url: std::env::var("BUILDER_API_URL")
                .unwrap_or_else(|_| DEFAULT_CONTENT_URL.to_string()),
            admin_url: std::env::var("ADMIN_API_URL")
                .unwrap_or_else(|_| DEFAULT_ADMIN_URL.to_string()),
            admin_token: std::env::var("ADMIN_API_TOKEN").ok(),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_timeout(raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(Error::Config {
            message: format!("CMS_TIMEOUT_SECS must be a positive integer, got {raw:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_new_uses_defaults() {
        let config = CmsConfig::new("key");
        assert_eq!(config.api_key, "key");
        assert_eq!(config.content_url, DEFAULT_CONTENT_URL);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout(" 30 ").unwrap(), 30);
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("soon").is_err());
    }
}
