// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Result Filter
//!
//! Confluence reports the same logical field in different shapes depending on
//! the endpoint and the `expand` parameter. Each field is read by an ordered
//! list of extraction strategies; the first one that yields a value wins.
//!
//! | Field     | Strategies (in order)                                                        |
//! |-----------|------------------------------------------------------------------------------|
//! | space key | `resultGlobalContainer.displayUrl`, item `url`, `content.space.key`, `space.key` |
//! | page id   | `content.id`, `id` (numbers normalized to strings)                           |
//! | ancestors | item `ancestors`, `content.ancestors`                                        |
//! | labels    | `metadata.labels` as a list, or as a `{results: [...]}` envelope             |
//!
//! [`ResultFilter`] re-applies the allow-list to search hits even though the
//! query was already scoped; this check, not the CQL, is the boundary.

use serde_json::Value;

use crate::domain::access_gate::AccessGate;
use crate::domain::page::{PageId, SpaceKey};

type Strategy<T> = fn(&Value) -> Option<T>;

const SPACE_KEY_STRATEGIES: &[Strategy<SpaceKey>] = &[
    space_from_container_url,
    space_from_item_url,
    space_from_content_object,
    space_from_own_object,
];

const PAGE_ID_STRATEGIES: &[Strategy<PageId>] = &[id_from_content_object, id_from_item];

const ANCESTOR_STRATEGIES: &[Strategy<Vec<PageId>>] = &[ancestors_from_item, ancestors_from_content_object];

fn first_match<T>(item: &Value, strategies: &[Strategy<T>]) -> Option<T> {
    strategies.iter().find_map(|strategy| strategy(item))
}

/// Walk a dotted path of object keys.
pub fn value_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(key))
}

pub fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    value_at(value, path).and_then(Value::as_str)
}

/// The `results` array of a paginated envelope; empty when absent.
pub fn results_of(envelope: &Value) -> &[Value] {
    envelope
        .get("results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Space key from a web path such as `/spaces/AR/pages/123/Title`.
pub fn space_from_path(path: &str) -> Option<SpaceKey> {
    let (_, rest) = path.split_once("/spaces/")?;
    let key = rest
        .split(|c: char| c == '/' || c == '?' || c == '#')
        .next()
        .unwrap_or("");
    if key.is_empty() {
        None
    } else {
        Some(SpaceKey::new(key))
    }
}

fn space_from_container_url(item: &Value) -> Option<SpaceKey> {
    str_at(item, &["resultGlobalContainer", "displayUrl"]).and_then(space_from_path)
}

fn space_from_item_url(item: &Value) -> Option<SpaceKey> {
    str_at(item, &["url"]).and_then(space_from_path)
}

fn space_from_content_object(item: &Value) -> Option<SpaceKey> {
    str_at(item, &["content", "space", "key"])
        .filter(|k| !k.is_empty())
        .map(SpaceKey::new)
}

fn space_from_own_object(item: &Value) -> Option<SpaceKey> {
    str_at(item, &["space", "key"])
        .filter(|k| !k.is_empty())
        .map(SpaceKey::new)
}

fn id_from_content_object(item: &Value) -> Option<PageId> {
    value_at(item, &["content", "id"]).and_then(PageId::from_value)
}

fn id_from_item(item: &Value) -> Option<PageId> {
    item.get("id").and_then(PageId::from_value)
}

fn ancestor_ids(list: &Value) -> Option<Vec<PageId>> {
    let entries = list.as_array()?;
    Some(
        entries
            .iter()
            .filter_map(|entry| match entry {
                Value::Object(_) => entry.get("id").and_then(PageId::from_value),
                other => PageId::from_value(other),
            })
            .collect(),
    )
}

fn ancestors_from_item(item: &Value) -> Option<Vec<PageId>> {
    item.get("ancestors").and_then(ancestor_ids)
}

fn ancestors_from_content_object(item: &Value) -> Option<Vec<PageId>> {
    value_at(item, &["content", "ancestors"]).and_then(ancestor_ids)
}

pub fn extract_space_key(item: &Value) -> Option<SpaceKey> {
    first_match(item, SPACE_KEY_STRATEGIES)
}

pub fn extract_page_id(item: &Value) -> Option<PageId> {
    first_match(item, PAGE_ID_STRATEGIES)
}

pub fn extract_ancestors(item: &Value) -> Vec<PageId> {
    first_match(item, ANCESTOR_STRATEGIES).unwrap_or_default()
}

/// Label names of a content object. The label field arrives either as a bare
/// list or as a paginated `{results: [...]}` envelope, and each label either
/// as a string or as an object carrying `name`.
pub fn extract_labels(content: &Value) -> Vec<String> {
    let Some(labels) = value_at(content, &["metadata", "labels"]) else {
        return Vec::new();
    };

    let entries: &[Value] = match labels {
        Value::Array(list) => list,
        Value::Object(_) => results_of(labels),
        _ => &[],
    };

    entries
        .iter()
        .filter_map(|label| match label {
            Value::String(name) => Some(name.clone()),
            Value::Object(_) => label.get("name").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .collect()
}

pub fn extract_version(content: &Value) -> Option<u64> {
    value_at(content, &["version", "number"]).and_then(Value::as_u64)
}

pub fn extract_title(item: &Value) -> String {
    str_at(item, &["title"])
        .or_else(|| str_at(item, &["content", "title"]))
        .unwrap_or_default()
        .to_string()
}

/// Normalized facts about one page, as needed by the access gate.
#[derive(Debug, Clone, PartialEq)]
pub struct PageFacts {
    /// The id the caller asked about
    pub id: PageId,
    pub title: String,
    pub space: Option<SpaceKey>,
    pub ancestors: Vec<PageId>,
    pub labels: Vec<String>,
    pub version: Option<u64>,
}

impl PageFacts {
    /// Read the facts of a fetched content object. The requested id is kept
    /// as the page identity so authorization is about what was asked for.
    pub fn from_content(requested: &PageId, content: &Value) -> Self {
        Self {
            id: requested.clone(),
            title: extract_title(content),
            space: extract_space_key(content),
            ancestors: extract_ancestors(content),
            labels: extract_labels(content),
            version: extract_version(content),
        }
    }
}

/// A search result that passed the allow-list.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmittedHit {
    pub id: PageId,
    pub space: SpaceKey,
}

#[derive(Debug, Clone)]
pub struct ResultFilter {
    gate: AccessGate,
}

impl ResultFilter {
    pub fn new(gate: AccessGate) -> Self {
        Self { gate }
    }

    /// Decide whether a raw search hit may be shown. Hits without an id or a
    /// resolvable space are dropped along with out-of-policy ones.
    pub fn admit(&self, item: &Value) -> Option<AdmittedHit> {
        let id = extract_page_id(item)?;
        let Some(space) = extract_space_key(item) else {
            tracing::debug!(page_id = %id, "Dropping search hit without a resolvable space");
            return None;
        };

        if !self.gate.space_allowed(&space) {
            tracing::debug!(page_id = %id, space = %space, "Dropping search hit outside allowed spaces");
            return None;
        }

        let ancestors = extract_ancestors(item);
        if !self.gate.subtree_allowed(&space, &id, &ancestors) {
            tracing::debug!(page_id = %id, space = %space, "Dropping search hit outside allowed subtrees");
            return None;
        }

        Some(AdmittedHit { id, space })
    }
}
