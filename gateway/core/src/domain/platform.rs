// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Platform
//!
//! Port to the content platform and the write payloads sent through it.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Anti-corruption boundary between the gateway and the Confluence REST API

// The port returns raw JSON on reads on purpose: the shapes vary by
// endpoint and expansion, and normalizing them is the result filter's job.
// Implementations live in infrastructure/ (REST client, in-memory fake).

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::domain::access_gate::CREATED_PAGE_LABEL;
use crate::domain::page::{PageId, SpaceKey};
use crate::domain::query::CqlQuery;

/// Fields that can be requested through `expand`.
pub mod expand {
    pub const BODY_STORAGE: &str = "body.storage";
    pub const SPACE: &str = "space";
    pub const VERSION: &str = "version";
    pub const LABELS: &str = "metadata.labels";
    pub const ANCESTORS: &str = "ancestors";
    /// Ancestor chain of each search hit
    pub const CONTENT_ANCESTORS: &str = "content.ancestors";
}

/// Domain interface for the content platform
#[async_trait]
pub trait ContentPlatform: Send + Sync {
    /// Site root used to turn relative `webui` links into absolute URLs
    fn base_url(&self) -> &str;

    /// Run a CQL search; returns the `{results: [...]}` envelope
    async fn search(&self, cql: &CqlQuery, limit: u32) -> Result<Value, PlatformError>;

    /// Fetch one content object with the given expansions
    async fn get_content(&self, id: &PageId, expand: &[&str]) -> Result<Value, PlatformError>;

    /// Create a page; returns the created content object
    async fn create_page(&self, page: &NewPage) -> Result<Value, PlatformError>;

    /// Replace a page's body; returns the updated content object
    async fn update_page(&self, id: &PageId, update: &PageUpdate) -> Result<Value, PlatformError>;

    /// Direct child pages; returns the `{results: [...]}` envelope
    async fn child_pages(&self, id: &PageId, limit: u32) -> Result<Value, PlatformError>;
}

/// Errors raised by platform adapters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpaceRef {
    pub key: SpaceKey,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentRef {
    pub id: PageId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageValue {
    pub value: String,
    pub representation: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageBody {
    pub storage: StorageValue,
}

impl StorageBody {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            storage: StorageValue {
                value: markup.into(),
                representation: "storage",
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelRef {
    pub prefix: &'static str,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPageMetadata {
    pub labels: Vec<LabelRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionRef {
    pub number: u64,
}

/// Body of `POST /rest/api/content`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPage {
    #[serde(rename = "type")]
    pub content_type: &'static str,
    pub title: String,
    pub ancestors: Vec<ContentRef>,
    pub space: SpaceRef,
    pub body: StorageBody,
    pub metadata: NewPageMetadata,
}

impl NewPage {
    /// A page under `parent_id`, labelled as machine-managed.
    pub fn managed(space: SpaceKey, parent_id: PageId, title: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            content_type: "page",
            title: title.into(),
            ancestors: vec![ContentRef { id: parent_id }],
            space: SpaceRef { key: space },
            body: StorageBody::new(markup),
            metadata: NewPageMetadata {
                labels: vec![LabelRef {
                    prefix: "global",
                    name: CREATED_PAGE_LABEL.to_string(),
                }],
            },
        }
    }
}

/// Body of `PUT /rest/api/content/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageUpdate {
    pub id: PageId,
    #[serde(rename = "type")]
    pub content_type: &'static str,
    pub title: String,
    pub space: SpaceRef,
    pub body: StorageBody,
    pub version: VersionRef,
}

impl PageUpdate {
    /// Replacement keeping title and space, one version past `current_version`.
    /// `None` when the next version number does not fit in a `u64`.
    pub fn replacing(
        id: PageId,
        title: impl Into<String>,
        space: SpaceKey,
        markup: impl Into<String>,
        current_version: u64,
    ) -> Option<Self> {
        let number = current_version.checked_add(1)?;
        Some(Self {
            id,
            content_type: "page",
            title: title.into(),
            space: SpaceRef { key: space },
            body: StorageBody::new(markup),
            version: VersionRef { number },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_page_wire_shape() {
        let page = NewPage::managed(SpaceKey::from("AR"), PageId::from("100"), "Notes", "<p>x</p>");

        assert_eq!(
            serde_json::to_value(&page).unwrap(),
            json!({
                "type": "page",
                "title": "Notes",
                "ancestors": [{"id": "100"}],
                "space": {"key": "AR"},
                "body": {"storage": {"value": "<p>x</p>", "representation": "storage"}},
                "metadata": {"labels": [{"prefix": "global", "name": "ai-managed"}]}
            })
        );
    }

    #[test]
    fn test_update_bumps_version() {
        let update = PageUpdate::replacing(PageId::from("200"), "Runbook", SpaceKey::from("AR"), "<p>y</p>", 7).unwrap();
        let value = serde_json::to_value(&update).unwrap();

        assert_eq!(value["version"]["number"], 8);
        assert_eq!(value["id"], "200");
        assert_eq!(value["type"], "page");
        assert_eq!(value["space"]["key"], "AR");
    }

    #[test]
    fn test_update_at_max_version_has_no_successor() {
        let update = PageUpdate::replacing(PageId::from("200"), "Runbook", SpaceKey::from("AR"), "<p/>", u64::MAX);
        assert!(update.is_none());
    }
}
