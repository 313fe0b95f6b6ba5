//! Client for the admin content-mutation API.
//!
//! `POST /api/admin/content/{type}` creates, `PUT .../{id}` updates and
//! `DELETE .../{id}` removes an entry. Request bodies are `{data, publish}`;
//! failed responses carry a JSON `{error}` (or `{message}`) payload.

use super::client::request_error;
use crate::config::cms::CmsConfig;
use crate::errors::{Error, Result};
use reqwest::{Method, StatusCode};
use serde_json::{Map, Value, json};
use std::future::Future;
use tracing::{info, instrument, warn};

/// Destination for content writes, implemented by [`AdminContentClient`] and
/// by in-memory fakes in tests.
pub trait ContentSink {
    /// Creates a new entry of `content_type`.
    fn create(
        &self,
        content_type: &str,
        data: &Map<String, Value>,
        publish: bool,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Replaces the fields of entry `id`.
    fn update(
        &self,
        content_type: &str,
        id: &str,
        data: &Map<String, Value>,
        publish: bool,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Sends content mutations to the site's admin API.
#[derive(Debug, Clone)]
pub struct AdminContentClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl AdminContentClient {
    /// Builds a client for `config.admin_url`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &CmsConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.admin_url.trim_end_matches('/').to_string(),
            token: config.admin_token.clone(),
        })
    }

    /// Endpoint for a content type, or for one entry of it.
    #[must_use]
    pub fn endpoint(&self, content_type: &str, id: Option<&str>) -> String {
        match id {
            Some(id) => format!("{}/api/admin/content/{content_type}/{id}", self.base_url),
            None => format!("{}/api/admin/content/{content_type}", self.base_url),
        }
    }

    /// Creates an entry and returns the API's response body.
    #[instrument(skip(self, data))]
    pub async fn create_entry(
        &self,
        content_type: &str,
        data: &Map<String, Value>,
        publish: bool,
    ) -> Result<Value> {
        let url = self.endpoint(content_type, None);
        let body = json!({ "data": data, "publish": publish });
        let response = self.send(Method::POST, &url, Some(&body)).await?;
        info!("Created {} entry", content_type);
        Ok(response)
    }

    /// Updates entry `id` and returns the API's response body.
    #[instrument(skip(self, data))]
    pub async fn update_entry(
        &self,
        content_type: &str,
        id: &str,
        data: &Map<String, Value>,
        publish: bool,
    ) -> Result<Value> {
        let url = self.endpoint(content_type, Some(id));
        let body = json!({ "data": data, "publish": publish });
        let response = self.send(Method::PUT, &url, Some(&body)).await?;
        info!("Updated {} entry {}", content_type, id);
        Ok(response)
    }

    /// Deletes entry `id`.
    #[instrument(skip(self))]
    pub async fn delete_entry(&self, content_type: &str, id: &str) -> Result<()> {
        let url = self.endpoint(content_type, Some(id));
        self.send(Method::DELETE, &url, None).await?;
        info!("Deleted {} entry {}", content_type, id);
        Ok(())
    }

    async fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Value> {
        let mut request = self.http.request(method, url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| request_error(e, url))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| request_error(e, url))?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)));
        }

        let message = error_message(&text);
        warn!("Admin API {} returned {}: {}", url, status, message);
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Unauthorized { message });
        }
        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl ContentSink for AdminContentClient {
    async fn create(
        &self,
        content_type: &str,
        data: &Map<String, Value>,
        publish: bool,
    ) -> Result<()> {
        self.create_entry(content_type, data, publish).await.map(|_| ())
    }

    async fn update(
        &self,
        content_type: &str,
        id: &str,
        data: &Map<String, Value>,
        publish: bool,
    ) -> Result<()> {
        self.update_entry(content_type, id, data, publish)
            .await
            .map(|_| ())
    }
}

// Pulls the human-readable message out of an error payload.
fn error_message(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|v| {
            v.get("error")
                .or_else(|| v.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| text.trim().to_string())
}
