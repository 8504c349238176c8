// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Confluence REST Adapter
//
// Anti-Corruption Layer for the Confluence Cloud REST API (v1 content API).
// Every request carries basic credentials (account email + API token).
// Non-2xx responses are surfaced with their raw body; nothing is retried.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{RequestBuilder, Url};
use serde_json::Value;
use std::time::Duration;

use crate::domain::page::PageId;
use crate::domain::platform::{expand as fields, ContentPlatform, NewPage, PageUpdate, PlatformError};
use crate::domain::query::CqlQuery;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for a Confluence site
#[derive(Debug, Clone)]
pub struct ConfluenceSettings {
    /// Site root, e.g. `https://example.atlassian.net/wiki`
    pub base_url: String,
    pub email: String,
    pub api_token: String,
    pub timeout: Duration,
}

impl ConfluenceSettings {
    pub fn new(base_url: impl Into<String>, email: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            email: email.into(),
            api_token: api_token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct ConfluenceClient {
    client: reqwest::Client,
    settings: ConfluenceSettings,
}

impl ConfluenceClient {
    pub fn new(settings: ConfluenceSettings) -> Result<Self, PlatformError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| PlatformError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, settings })
    }

    /// `{base}/rest/api/content/{id}[/{tail}...]` with every segment percent-encoded
    fn content_url(&self, id: &PageId, tail: &[&str]) -> Result<Url, PlatformError> {
        let mut url = Url::parse(&self.settings.base_url)
            .map_err(|e| PlatformError::Network(format!("Invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| PlatformError::Network("Base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(["rest", "api", "content", id.as_str()])
            .extend(tail);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, PlatformError> {
        let response = request
            .basic_auth(&self.settings.email, Some(&self.settings.api_token))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| PlatformError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| PlatformError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl ContentPlatform for ConfluenceClient {
    fn base_url(&self) -> &str {
        &self.settings.base_url
    }

    async fn search(&self, cql: &CqlQuery, limit: u32) -> Result<Value, PlatformError> {
        let url = format!("{}/rest/api/search", self.settings.base_url);
        let limit = limit.to_string();
        self.send(
            self.client
                .get(&url)
                .query(&[
                    ("cql", cql.as_str()),
                    ("limit", limit.as_str()),
                    ("expand", fields::CONTENT_ANCESTORS),
                ]),
        )
        .await
    }

    async fn get_content(&self, id: &PageId, expand: &[&str]) -> Result<Value, PlatformError> {
        let mut request = self.client.get(self.content_url(id, &[])?);
        if !expand.is_empty() {
            request = request.query(&[("expand", expand.join(","))]);
        }
        self.send(request).await
    }

    async fn create_page(&self, page: &NewPage) -> Result<Value, PlatformError> {
        let url = format!("{}/rest/api/content", self.settings.base_url);
        self.send(self.client.post(&url).json(page)).await
    }

    async fn update_page(&self, id: &PageId, update: &PageUpdate) -> Result<Value, PlatformError> {
        self.send(self.client.put(self.content_url(id, &[])?).json(update))
            .await
    }

    async fn child_pages(&self, id: &PageId, limit: u32) -> Result<Value, PlatformError> {
        let url = self.content_url(id, &["child", "page"])?;
        self.send(self.client.get(url).query(&[("limit", limit.to_string())]))
            .await
    }
}
