// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Page
//!
//! Identifier value objects and the transient page shapes returned to callers.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Implements page identity and output models

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Key of a Confluence space. Case-sensitive, compared by exact match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceKey(pub String);

impl SpaceKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpaceKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

/// Opaque page identifier.
///
/// Confluence reports ids as strings in most payloads but as JSON numbers in
/// some, and hand-written configuration may do either. Both forms normalize to
/// the same decimal string so comparisons never depend on the wire type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PageId(pub String);

impl PageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalize a JSON scalar into a page id. Empty strings, nulls and
    /// structured values yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(Self(s.trim().to_string())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for PageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Text(s) if !s.trim().is_empty() => Ok(Self(s.trim().to_string())),
            RawId::Text(_) => Err(serde::de::Error::custom("page id cannot be empty")),
            RawId::Number(n) => Ok(Self(n.to_string())),
        }
    }
}

/// A search hit that survived policy filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub id: PageId,
    pub title: String,
    pub space_key: SpaceKey,
    pub url: String,
    #[serde(default)]
    pub excerpt: String,
}

/// A single page with its storage markup and plain-text projection.
///
/// `labels` and `version` are only populated by merge preparation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDetail {
    pub id: PageId,
    pub title: String,
    pub space_key: Option<SpaceKey>,
    pub url: String,
    pub text_content: String,
    pub storage_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

/// Direct child of a listed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildPage {
    pub id: PageId,
    pub title: String,
    pub url: String,
}

/// Outcome of a successful create or update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageReference {
    pub id: PageId,
    pub space_key: SpaceKey,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_id_normalizes_numbers() {
        assert_eq!(PageId::from_value(&json!(12345)), Some(PageId::from("12345")));
        assert_eq!(PageId::from_value(&json!("12345")), Some(PageId::from("12345")));
        assert_eq!(PageId::from_value(&json!("")), None);
        assert_eq!(PageId::from_value(&json!(null)), None);
        assert_eq!(PageId::from_value(&json!({"id": "1"})), None);
    }

    #[test]
    fn test_page_id_deserializes_from_either_wire_type() {
        let ids: Vec<PageId> = serde_json::from_value(json!(["100", 200])).unwrap();
        assert_eq!(ids, vec![PageId::from("100"), PageId::from("200")]);

        assert!(serde_json::from_value::<PageId>(json!("")).is_err());
    }

    #[test]
    fn test_detail_serializes_camel_case_without_empty_meta() {
        let detail = PageDetail {
            id: PageId::from("1"),
            title: "Runbook".to_string(),
            space_key: Some(SpaceKey::from("AR")),
            url: "https://wiki/spaces/AR/pages/1".to_string(),
            text_content: "Hello".to_string(),
            storage_content: "<p>Hello</p>".to_string(),
            labels: None,
            version: None,
        };

        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["spaceKey"], "AR");
        assert_eq!(value["textContent"], "Hello");
        assert!(value.get("labels").is_none());
        assert!(value.get("version").is_none());
    }
}
