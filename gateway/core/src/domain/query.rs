// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # CQL Query Builder
//!
//! Compiles a caller phrase plus the allow-list into a Confluence Query
//! Language expression:
//!
//! ```text
//! <text clause> AND (<space clause>) AND (<subtree clause>)
//! ```
//!
//! - **text clause**: `text~"<phrase>" AND type=page`, or `(<phrase>) AND type=page`
//!   when the phrase already looks like CQL (contains `=` or ` in `)
//! - **space clause**: `space = "A" OR space = "B"` over every allowed space
//! - **subtree clause**: per space with parents,
//!   `(space = "S" AND (id in ("1") OR ancestor in ("1")))`, OR-ed together
//!
//! Empty clauses are omitted. Scoping here keeps out-of-policy content from
//! ever leaving Confluence, but it is not the security boundary; results are
//! re-checked by the result filter.

use std::fmt;

use crate::domain::page::PageId;
use crate::domain::policy::PolicyConfig;

/// A compiled CQL expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CqlQuery(String);

impl CqlQuery {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct QueryBuilder;

impl QueryBuilder {
    pub fn build(phrase: &str, policy: &PolicyConfig) -> CqlQuery {
        let mut clauses = vec![Self::text_clause(phrase)];

        if let Some(spaces) = Self::space_clause(policy) {
            clauses.push(format!("({})", spaces));
        }

        if let Some(subtrees) = Self::subtree_clause(policy) {
            clauses.push(format!("({})", subtrees));
        }

        CqlQuery(clauses.join(" AND "))
    }

    /// A phrase containing `=` or the word `in` is treated as a caller-supplied
    /// CQL fragment rather than free text.
    pub fn is_structured_fragment(phrase: &str) -> bool {
        phrase.contains('=') || phrase.to_uppercase().contains(" IN ")
    }

    fn text_clause(phrase: &str) -> String {
        if Self::is_structured_fragment(phrase) {
            format!("({}) AND type=page", phrase)
        } else {
            format!("text~{} AND type=page", quote(phrase))
        }
    }

    fn space_clause(policy: &PolicyConfig) -> Option<String> {
        if policy.allowed_spaces.is_empty() {
            return None;
        }

        Some(
            policy
                .allowed_spaces
                .iter()
                .map(|space| format!("space = {}", quote(space.as_str())))
                .collect::<Vec<_>>()
                .join(" OR "),
        )
    }

    fn subtree_clause(policy: &PolicyConfig) -> Option<String> {
        let per_space: Vec<String> = policy
            .allowed_parents
            .iter()
            .filter(|(_, parents)| !parents.is_empty())
            .map(|(space, parents)| {
                let ids = id_list(parents.iter());
                format!(
                    "(space = {} AND (id in ({ids}) OR ancestor in ({ids})))",
                    quote(space.as_str()),
                )
            })
            .collect();

        if per_space.is_empty() {
            None
        } else {
            Some(per_space.join(" OR "))
        }
    }
}

/// Wrap a value in a CQL string literal.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

fn id_list<'a>(ids: impl Iterator<Item = &'a PageId>) -> String {
    ids.map(|id| quote(id.as_str())).collect::<Vec<_>>().join(", ")
}
