// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-memory content platform
//!
//! Keeps pages as Confluence-shaped JSON and records every call so tests can
//! assert on what reached the platform (and, just as often, what did not).
//! Writes follow Confluence semantics closely enough for the gateway: created
//! pages get an id, a version of 1 and their parent's ancestor chain; updates
//! must carry exactly the next version number or fail with HTTP 409.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::domain::page::{PageId, SpaceKey};
use crate::domain::platform::{ContentPlatform, NewPage, PageUpdate, PlatformError};
use crate::domain::query::CqlQuery;

/// A call that reached the platform
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    Search { cql: String, limit: u32 },
    GetContent { id: PageId, expand: Vec<String> },
    CreatePage { space: SpaceKey, title: String },
    UpdatePage { id: PageId, version: u64 },
    ChildPages { id: PageId, limit: u32 },
}

impl PlatformCall {
    pub fn is_write(&self) -> bool {
        matches!(self, Self::CreatePage { .. } | Self::UpdatePage { .. })
    }
}

/// Seed data for one page
#[derive(Debug, Clone)]
pub struct SeedPage {
    pub id: PageId,
    pub space: SpaceKey,
    pub title: String,
    pub ancestors: Vec<PageId>,
    pub labels: Vec<String>,
    pub body: String,
    pub version: u64,
}

impl SeedPage {
    pub fn new(id: &str, space: &str, title: &str) -> Self {
        Self {
            id: PageId::from(id),
            space: SpaceKey::from(space),
            title: title.to_string(),
            ancestors: Vec::new(),
            labels: Vec::new(),
            body: String::new(),
            version: 1,
        }
    }

    pub fn ancestors(mut self, ids: &[&str]) -> Self {
        self.ancestors = ids.iter().map(|id| PageId::from(*id)).collect();
        self
    }

    pub fn labels(mut self, labels: &[&str]) -> Self {
        self.labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn body(mut self, markup: &str) -> Self {
        self.body = markup.to_string();
        self
    }

    pub fn version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }
}

#[derive(Default)]
struct State {
    pages: BTreeMap<PageId, SeedPage>,
    search_results: Vec<Value>,
    calls: Vec<PlatformCall>,
    failure: Option<PlatformError>,
    write_failure: Option<PlatformError>,
    next_id: u64,
}

pub struct InMemoryPlatform {
    base_url: String,
    state: Mutex<State>,
}

impl InMemoryPlatform {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            state: Mutex::new(State {
                next_id: 10_000,
                ..State::default()
            }),
        }
    }

    pub fn with_page(self, page: SeedPage) -> Self {
        self.insert_page(page);
        self
    }

    pub fn insert_page(&self, page: SeedPage) {
        self.state.lock().pages.insert(page.id.clone(), page);
    }

    /// Raw items returned by every subsequent search
    pub fn set_search_results(&self, results: Vec<Value>) {
        self.state.lock().search_results = results;
    }

    /// Make every subsequent call fail with `error`
    pub fn fail_with(&self, error: PlatformError) {
        self.state.lock().failure = Some(error);
    }

    /// Make subsequent creates and updates fail with `error`; reads still work
    pub fn fail_writes_with(&self, error: PlatformError) {
        self.state.lock().write_failure = Some(error);
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.state.lock().calls.clone()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().calls.iter().filter(|c| c.is_write()).count()
    }

    fn record(&self, call: PlatformCall) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        let failure = if call.is_write() {
            state.failure.as_ref().or(state.write_failure.as_ref()).cloned()
        } else {
            state.failure.clone()
        };
        state.calls.push(call);
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn not_found(id: &PageId) -> PlatformError {
        PlatformError::Http {
            status: 404,
            body: format!("No content found with id: {}", id),
        }
    }

    fn render(page: &SeedPage) -> Value {
        json!({
            "id": page.id,
            "type": "page",
            "status": "current",
            "title": page.title,
            "space": {"key": page.space},
            "ancestors": page.ancestors.iter().map(|a| json!({"id": a})).collect::<Vec<_>>(),
            "version": {"number": page.version},
            "metadata": {
                "labels": {
                    "results": page.labels.iter().map(|l| json!({"prefix": "global", "name": l})).collect::<Vec<_>>(),
                    "size": page.labels.len()
                }
            },
            "body": {"storage": {"value": page.body, "representation": "storage"}},
            "_links": {"webui": format!("/spaces/{}/pages/{}", page.space, page.id)}
        })
    }
}

#[async_trait]
impl ContentPlatform for InMemoryPlatform {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn search(&self, cql: &CqlQuery, limit: u32) -> Result<Value, PlatformError> {
        self.record(PlatformCall::Search {
            cql: cql.to_string(),
            limit,
        })?;
        let state = self.state.lock();
        let results: Vec<Value> = state.search_results.iter().take(limit as usize).cloned().collect();
        Ok(json!({"results": results, "size": results.len()}))
    }

    async fn get_content(&self, id: &PageId, expand: &[&str]) -> Result<Value, PlatformError> {
        self.record(PlatformCall::GetContent {
            id: id.clone(),
            expand: expand.iter().map(|e| e.to_string()).collect(),
        })?;
        let state = self.state.lock();
        state
            .pages
            .get(id)
            .map(Self::render)
            .ok_or_else(|| Self::not_found(id))
    }

    async fn create_page(&self, page: &NewPage) -> Result<Value, PlatformError> {
        self.record(PlatformCall::CreatePage {
            space: page.space.key.clone(),
            title: page.title.clone(),
        })?;

        let mut state = self.state.lock();
        let parent_id = page
            .ancestors
            .first()
            .map(|a| a.id.clone())
            .ok_or_else(|| PlatformError::Http {
                status: 400,
                body: "A page must have a parent".to_string(),
            })?;
        let parent = state.pages.get(&parent_id).ok_or_else(|| Self::not_found(&parent_id))?;

        let mut ancestors = parent.ancestors.clone();
        ancestors.push(parent_id);

        state.next_id += 1;
        let created = SeedPage {
            id: PageId::new(state.next_id.to_string()),
            space: page.space.key.clone(),
            title: page.title.clone(),
            ancestors,
            labels: page.metadata.labels.iter().map(|l| l.name.clone()).collect(),
            body: page.body.storage.value.clone(),
            version: 1,
        };
        let rendered = Self::render(&created);
        state.pages.insert(created.id.clone(), created);
        Ok(rendered)
    }

    async fn update_page(&self, id: &PageId, update: &PageUpdate) -> Result<Value, PlatformError> {
        self.record(PlatformCall::UpdatePage {
            id: id.clone(),
            version: update.version.number,
        })?;

        let mut state = self.state.lock();
        let page = state.pages.get_mut(id).ok_or_else(|| Self::not_found(id))?;
        if Some(update.version.number) != page.version.checked_add(1) {
            return Err(PlatformError::Http {
                status: 409,
                body: format!(
                    "Version must be incremented on update. Current version is: {}",
                    page.version
                ),
            });
        }

        page.version = update.version.number;
        page.title = update.title.clone();
        page.body = update.body.storage.value.clone();
        Ok(Self::render(page))
    }

    async fn child_pages(&self, id: &PageId, limit: u32) -> Result<Value, PlatformError> {
        self.record(PlatformCall::ChildPages {
            id: id.clone(),
            limit,
        })?;
        let state = self.state.lock();
        if !state.pages.contains_key(id) {
            return Err(Self::not_found(id));
        }
        let results: Vec<Value> = state
            .pages
            .values()
            .filter(|p| p.ancestors.last() == Some(id))
            .take(limit as usize)
            .map(Self::render)
            .collect();
        Ok(json!({"results": results, "size": results.len()}))
    }
}
