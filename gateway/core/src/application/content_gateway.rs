// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Content Gateway
//!
//! The six operations exposed to the agent. Each one is a strictly sequential
//! chain of platform calls with the access gate in between; every outcome,
//! including denials and upstream failures, comes back as a `Result` value.
//!
//! | Operation              | Authorization                                        |
//! |------------------------|------------------------------------------------------|
//! | `search`               | query scoping, then per-hit space + subtree filter   |
//! | `get_page`             | none (see DESIGN.md, read-by-id is left open)        |
//! | `create_page`          | allowed space + explicitly listed parent             |
//! | `update_full_page`     | allowed space + subtree + managed label              |
//! | `prepare_merge_update` | same as update, read-only                            |
//! | `list_children`        | allowed space + subtree of the listed page           |

use serde_json::Value;
use std::sync::Arc;

use crate::domain::access_gate::{AccessGate, MutationPurpose, PolicyViolation};
use crate::domain::page::{ChildPage, PageDetail, PageId, PageReference, PageSummary, SpaceKey};
use crate::domain::platform::{expand, ContentPlatform, NewPage, PageUpdate, PlatformError};
use crate::domain::policy::PolicyConfig;
use crate::domain::query::QueryBuilder;
use crate::domain::result_filter::{self, PageFacts, ResultFilter};
use crate::infrastructure::storage_text::storage_to_text;

/// Page size for search and child listing
pub const DEFAULT_RESULT_LIMIT: u32 = 50;

const FETCH_EXPANSIONS: &[&str] = &[expand::BODY_STORAGE, expand::SPACE];

const MUTATION_EXPANSIONS: &[&str] = &[
    expand::BODY_STORAGE,
    expand::SPACE,
    expand::VERSION,
    expand::LABELS,
    expand::ANCESTORS,
];

const LISTING_EXPANSIONS: &[&str] = &[expand::ANCESTORS, expand::SPACE];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    PolicyDenied(#[from] PolicyViolation),

    #[error("{context}{source}")]
    Upstream {
        context: &'static str,
        #[source]
        source: PlatformError,
    },
}

impl GatewayError {
    fn upstream(context: &'static str) -> impl Fn(PlatformError) -> Self {
        move |source| Self::Upstream { context, source }
    }

    pub fn is_policy_denial(&self) -> bool {
        matches!(self, Self::PolicyDenied(_))
    }
}

pub struct ContentGateway {
    platform: Arc<dyn ContentPlatform>,
    gate: AccessGate,
    filter: ResultFilter,
    result_limit: u32,
}

impl ContentGateway {
    pub fn new(platform: Arc<dyn ContentPlatform>, policy: Arc<PolicyConfig>) -> Self {
        let gate = AccessGate::new(policy);
        Self {
            platform,
            filter: ResultFilter::new(gate.clone()),
            gate,
            result_limit: DEFAULT_RESULT_LIMIT,
        }
    }

    pub fn with_result_limit(mut self, limit: u32) -> Self {
        self.result_limit = limit;
        self
    }

    pub fn policy(&self) -> &PolicyConfig {
        self.gate.policy()
    }

    /// Search pages inside the allow-list. An empty space allow-list fails
    /// closed: nothing is returned and Confluence is not contacted.
    pub async fn search(&self, query: &str) -> Result<Vec<PageSummary>, GatewayError> {
        if self.policy().is_closed() {
            tracing::warn!("Search requested with an empty space allow-list, returning no results");
            return Ok(Vec::new());
        }

        let cql = QueryBuilder::build(query, self.policy());
        tracing::debug!(cql = %cql, "Searching Confluence");

        let response = self
            .platform
            .search(&cql, self.result_limit)
            .await
            .map_err(GatewayError::upstream("Error searching Confluence: "))?;

        let raw = result_filter::results_of(&response);
        let summaries: Vec<PageSummary> = raw
            .iter()
            .filter_map(|item| {
                let hit = self.filter.admit(item)?;
                Some(PageSummary {
                    id: hit.id,
                    title: result_filter::extract_title(item),
                    space_key: hit.space,
                    url: self.absolute_url(result_filter::str_at(item, &["url"])),
                    excerpt: result_filter::str_at(item, &["excerpt"])
                        .unwrap_or_default()
                        .to_string(),
                })
            })
            .collect();

        tracing::debug!(returned = raw.len(), admitted = summaries.len(), "Search filtered");
        Ok(summaries)
    }

    /// Fetch a page by id with its plain-text projection. Reads by id are not
    /// policy-checked.
    pub async fn get_page(&self, page_id: &PageId) -> Result<PageDetail, GatewayError> {
        tracing::debug!(page_id = %page_id, "Fetching page without policy check");

        let content = self
            .platform
            .get_content(page_id, FETCH_EXPANSIONS)
            .await
            .map_err(GatewayError::upstream(""))?;

        Ok(self.page_detail(page_id, &content, None))
    }

    /// Create a machine-managed page directly under an allowed parent.
    pub async fn create_page(
        &self,
        space: &SpaceKey,
        parent_id: &PageId,
        title: &str,
        body: &str,
    ) -> Result<PageReference, GatewayError> {
        self.gate.authorize_create(space, parent_id)?;

        let page = NewPage::managed(space.clone(), parent_id.clone(), title, body);
        let created = self
            .platform
            .create_page(&page)
            .await
            .map_err(GatewayError::upstream(""))?;

        let id = PageId::from_value(&created["id"]).ok_or_else(|| GatewayError::Upstream {
            context: "",
            source: PlatformError::InvalidResponse("created page has no id".to_string()),
        })?;

        tracing::info!(page_id = %id, space = %space, parent_id = %parent_id, "Created page");
        Ok(PageReference {
            url: self.web_url(&created),
            id,
            space_key: space.clone(),
        })
    }

    /// Overwrite the body of a managed page, keeping its title and space.
    pub async fn update_full_page(&self, page_id: &PageId, body: &str) -> Result<PageReference, GatewayError> {
        let current = self.fetch_for_mutation(page_id).await?;
        let facts = PageFacts::from_content(page_id, &current);
        let space = self.gate.authorize_mutation(&facts, MutationPurpose::Update)?;

        let current_version = facts.version.unwrap_or(1);
        let update = PageUpdate::replacing(page_id.clone(), facts.title, space.clone(), body, current_version)
            .ok_or_else(|| GatewayError::Upstream {
                context: "",
                source: PlatformError::InvalidResponse(format!("page version {} has no successor", current_version)),
            })?;

        let updated = self
            .platform
            .update_page(page_id, &update)
            .await
            .map_err(GatewayError::upstream(""))?;

        tracing::info!(
            page_id = %page_id,
            space = %space,
            version = update.version.number,
            "Updated page"
        );
        Ok(PageReference {
            id: PageId::from_value(&updated["id"]).unwrap_or_else(|| page_id.clone()),
            space_key: space,
            url: self.web_url(&updated),
        })
    }

    /// Everything a caller needs to merge changes into a managed page before
    /// calling `update_full_page`. Read-only.
    pub async fn prepare_merge_update(&self, page_id: &PageId) -> Result<PageDetail, GatewayError> {
        let current = self.fetch_for_mutation(page_id).await?;
        let facts = PageFacts::from_content(page_id, &current);
        self.gate
            .authorize_mutation(&facts, MutationPurpose::MergePreparation)?;

        Ok(self.page_detail(page_id, &current, Some(facts)))
    }

    /// Direct children of a page inside an allowed subtree. Children inherit
    /// the parent's grant and are returned unfiltered.
    pub async fn list_children(&self, page_id: &PageId) -> Result<Vec<ChildPage>, GatewayError> {
        let parent = self
            .platform
            .get_content(page_id, LISTING_EXPANSIONS)
            .await
            .map_err(GatewayError::upstream("Error verifying parent page: "))?;
        self.gate
            .authorize_listing(&PageFacts::from_content(page_id, &parent))?;

        let children = self
            .platform
            .child_pages(page_id, self.result_limit)
            .await
            .map_err(GatewayError::upstream("Error fetching children: "))?;

        Ok(result_filter::results_of(&children)
            .iter()
            .filter_map(|child| {
                Some(ChildPage {
                    id: PageId::from_value(child.get("id")?)?,
                    title: result_filter::extract_title(child),
                    url: self.web_url(child),
                })
            })
            .collect())
    }

    async fn fetch_for_mutation(&self, page_id: &PageId) -> Result<Value, GatewayError> {
        self.platform
            .get_content(page_id, MUTATION_EXPANSIONS)
            .await
            .map_err(GatewayError::upstream(""))
    }

    fn page_detail(&self, requested: &PageId, content: &Value, meta: Option<PageFacts>) -> PageDetail {
        let storage = result_filter::str_at(content, &["body", "storage", "value"])
            .unwrap_or_default()
            .to_string();

        PageDetail {
            id: PageId::from_value(&content["id"]).unwrap_or_else(|| requested.clone()),
            title: result_filter::extract_title(content),
            space_key: result_filter::str_at(content, &["space", "key"]).map(SpaceKey::new),
            url: self.web_url(content),
            text_content: storage_to_text(&storage),
            storage_content: storage,
            labels: meta.as_ref().map(|facts| facts.labels.clone()),
            version: meta.and_then(|facts| facts.version),
        }
    }

    fn web_url(&self, content: &Value) -> String {
        self.absolute_url(result_filter::str_at(content, &["_links", "webui"]))
    }

    fn absolute_url(&self, relative: Option<&str>) -> String {
        format!("{}{}", self.platform.base_url(), relative.unwrap_or_default())
    }
}
