//! Client for the public CMS content API.
//!
//! Every request carries the configured timeout; a hung request surfaces as
//! [`Error::Timeout`] instead of leaving the caller waiting forever.

use super::content::{ContentEntry, ContentQuery, ContentResponse};
use crate::config::cms::CmsConfig;
use crate::errors::{Error, Result};
use tracing::{debug, error, instrument};

/// Reads content entries from the CMS.
#[derive(Debug, Clone)]
pub struct CmsClient {
    http: reqwest::Client,
    config: CmsConfig,
}

impl CmsClient {
    /// Builds a client using `config`'s timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: CmsConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// URL of a content model's endpoint.
    #[must_use]
    pub fn model_url(&self, model: &str) -> String {
        format!("{}/{}", self.config.content_url.trim_end_matches('/'), model)
    }

    /// Fetches entries of `model` matching `query`.
    ///
    /// # Errors
    /// - [`Error::Timeout`] when the request exceeds the configured timeout
    /// - [`Error::Api`] for non-2xx responses
    /// - [`Error::Http`] for connection or decoding failures
    #[instrument(skip(self, query))]
    pub async fn fetch(&self, model: &str, query: &ContentQuery) -> Result<Vec<ContentEntry>> {
        let url = self.model_url(model);
        let response = self
            .http
            .get(&url)
            .query(&query.to_params(&self.config.api_key))
            .send()
            .await
            .map_err(|e| request_error(e, &url))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ContentResponse = response
            .json()
            .await
            .map_err(|e| request_error(e, &url))?;
        debug!("Fetched {} {} entries", body.results.len(), model);
        Ok(body.results)
    }

    /// Like [`CmsClient::fetch`], but logs failures and returns an empty list so
    /// public pages degrade to their empty state.
    pub async fn fetch_or_empty(&self, model: &str, query: &ContentQuery) -> Vec<ContentEntry> {
        self.fetch(model, query)
            .await
            .inspect_err(|e| error!("Failed to fetch {} content: {}", model, e))
            .unwrap_or_default()
    }
}

pub(crate) fn request_error(e: reqwest::Error, url: &str) -> Error {
    if e.is_timeout() {
        Error::Timeout {
            url: url.to_string(),
        }
    } else {
        Error::Http(e)
    }
}
