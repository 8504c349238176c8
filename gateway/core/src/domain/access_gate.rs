// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Access Gate
//!
//! Authorization predicates evaluated against the immutable [`PolicyConfig`].
//! This is the security boundary: CQL scoping narrows what Confluence returns,
//! but every decision that matters is re-made here on normalized data.
//!
//! ## Predicates
//!
//! - [`AccessGate::space_allowed`]: exact membership in `allowed_spaces`
//! - [`AccessGate::subtree_allowed`]: the page is an allowed parent, or one of
//!   its ancestors is
//! - [`AccessGate::has_managed_label`]: the page carries `ai-generated` or
//!   `ai-managed`
//!
//! ## Composed Checks
//!
//! Operations call the `authorize_*` methods, which apply the predicates in a
//! fixed order and return the first [`PolicyViolation`]. A violation is a value
//! handed back to the caller, never a panic.

use std::sync::Arc;

use crate::domain::page::{PageId, SpaceKey};
use crate::domain::policy::PolicyConfig;
use crate::domain::result_filter::PageFacts;

/// Labels marking a page as open to automated edits.
pub const MANAGED_LABELS: [&str; 2] = ["ai-generated", "ai-managed"];

/// Label attached to every page the gateway creates.
pub const CREATED_PAGE_LABEL: &str = "ai-managed";

/// Why a request was denied. The `Display` text is shown to the agent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("Space '{space}' is not in the allowed list.")]
    SpaceNotAllowed { space: String },

    #[error("Parent ID '{parent_id}' is not allowed for space '{space}'.")]
    ParentNotAllowed { parent_id: String, space: String },

    #[error("Page in space '{space}' cannot be modified (space not allowed).")]
    SpaceNotModifiable { space: String },

    #[error("Page in space '{space}' cannot be prepared for merge (space not allowed).")]
    SpaceNotPreparable { space: String },

    #[error("Page '{page_id}' is outside the allowed parent pages for space '{space}'.")]
    OutsideAllowedSubtree { page_id: String, space: String },

    #[error("Page does not have required 'ai-generated' or 'ai-managed' labels.")]
    MissingManagedLabel,

    #[error("Space '{space}' not allowed")]
    ListingSpaceNotAllowed { space: String },

    #[error("Parent page is not accessible under current permissions")]
    ParentNotAccessible,
}

impl PolicyViolation {
    /// Short tag for structured logs.
    pub fn check(&self) -> &'static str {
        match self {
            Self::SpaceNotAllowed { .. }
            | Self::SpaceNotModifiable { .. }
            | Self::SpaceNotPreparable { .. }
            | Self::ListingSpaceNotAllowed { .. } => "space",
            Self::ParentNotAllowed { .. } => "parent",
            Self::OutsideAllowedSubtree { .. } | Self::ParentNotAccessible => "subtree",
            Self::MissingManagedLabel => "label",
        }
    }
}

/// Which mutating flow is asking; only changes the space-denial wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPurpose {
    Update,
    MergePreparation,
}

#[derive(Debug, Clone)]
pub struct AccessGate {
    policy: Arc<PolicyConfig>,
}

impl AccessGate {
    pub fn new(policy: Arc<PolicyConfig>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    pub fn space_allowed(&self, space: &SpaceKey) -> bool {
        self.policy.allowed_spaces.contains(space)
    }

    /// True iff `page_id` is an allowed parent of `space`, or shares at least
    /// one ancestor with that parent set. A page with no ancestors that is not
    /// itself listed is denied.
    pub fn subtree_allowed(&self, space: &SpaceKey, page_id: &PageId, ancestors: &[PageId]) -> bool {
        let Some(parents) = self.policy.parents_for(space) else {
            return false;
        };
        parents.contains(page_id) || ancestors.iter().any(|a| parents.contains(a))
    }

    /// Exact parent membership, used for creation. Descendants of an allowed
    /// parent do not qualify.
    pub fn parent_allowed(&self, space: &SpaceKey, parent_id: &PageId) -> bool {
        self.policy
            .parents_for(space)
            .map(|parents| parents.contains(parent_id))
            .unwrap_or(false)
    }

    pub fn has_managed_label<S: AsRef<str>>(labels: &[S]) -> bool {
        labels
            .iter()
            .any(|label| MANAGED_LABELS.contains(&label.as_ref()))
    }

    /// Creation requires an allowed space and an explicitly listed parent.
    pub fn authorize_create(&self, space: &SpaceKey, parent_id: &PageId) -> Result<(), PolicyViolation> {
        if !self.space_allowed(space) {
            return Err(self.deny(PolicyViolation::SpaceNotAllowed {
                space: space.to_string(),
            }));
        }

        if !self.parent_allowed(space, parent_id) {
            return Err(self.deny(PolicyViolation::ParentNotAllowed {
                parent_id: parent_id.to_string(),
                space: space.to_string(),
            }));
        }

        Ok(())
    }

    /// Checks for updating (or preparing to update) an existing page, in
    /// order: space, subtree, managed label. Returns the page's space key.
    pub fn authorize_mutation(
        &self,
        page: &PageFacts,
        purpose: MutationPurpose,
    ) -> Result<SpaceKey, PolicyViolation> {
        let space = match &page.space {
            Some(space) if self.space_allowed(space) => space.clone(),
            other => {
                let space = display_space(other.as_ref());
                return Err(self.deny(match purpose {
                    MutationPurpose::Update => PolicyViolation::SpaceNotModifiable { space },
                    MutationPurpose::MergePreparation => PolicyViolation::SpaceNotPreparable { space },
                }));
            }
        };

        if !self.subtree_allowed(&space, &page.id, &page.ancestors) {
            return Err(self.deny(PolicyViolation::OutsideAllowedSubtree {
                page_id: page.id.to_string(),
                space: space.to_string(),
            }));
        }

        if !Self::has_managed_label(&page.labels) {
            return Err(self.deny(PolicyViolation::MissingManagedLabel));
        }

        Ok(space)
    }

    /// Checks before listing the children of a page: the page must sit in an
    /// allowed space and inside an allowed subtree.
    pub fn authorize_listing(&self, page: &PageFacts) -> Result<SpaceKey, PolicyViolation> {
        let space = match &page.space {
            Some(space) if self.space_allowed(space) => space.clone(),
            other => {
                return Err(self.deny(PolicyViolation::ListingSpaceNotAllowed {
                    space: display_space(other.as_ref()),
                }));
            }
        };

        if !self.subtree_allowed(&space, &page.id, &page.ancestors) {
            return Err(self.deny(PolicyViolation::ParentNotAccessible));
        }

        Ok(space)
    }

    fn deny(&self, violation: PolicyViolation) -> PolicyViolation {
        tracing::warn!(check = violation.check(), reason = %violation, "Policy denied request");
        violation
    }
}

fn display_space(space: Option<&SpaceKey>) -> String {
    space.map(|s| s.to_string()).unwrap_or_else(|| "unknown".to_string())
}
