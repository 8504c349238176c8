// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Allow-list Policy
//
// The policy is the whole authorization state of the process:
// - which spaces the agent may see or touch
// - per space, which parent pages root the subtrees it may work in
//
// It is loaded once at startup and shared read-only (`Arc<PolicyConfig>`).
// A missing or unreadable configuration degrades to an empty policy, which
// denies everything.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::domain::page::{PageId, SpaceKey};

/// Allow-list of spaces and per-space root parent pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Spaces the agent may search and mutate in.
    #[serde(default, alias = "allowedSpaces")]
    pub allowed_spaces: BTreeSet<SpaceKey>,

    /// Per space, the pages whose subtrees are in scope. Keys need not be in
    /// `allowed_spaces`; space membership is always checked separately.
    #[serde(default, alias = "allowedParents")]
    pub allowed_parents: BTreeMap<SpaceKey, BTreeSet<PageId>>,
}

/// Where the active policy came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicySource {
    /// `--config` flag or `CONFLUENCE_MCP_CONFIG`
    Explicit(PathBuf),
    /// `./config.json`
    WorkingDirectory(PathBuf),
    /// `config.json` next to the installed binary
    InstallDirectory(PathBuf),
    /// Nothing usable was found
    Empty,
}

impl PolicySource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::WorkingDirectory(p) | Self::InstallDirectory(p) => Some(p),
            Self::Empty => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Explicit(p) => format!("explicit path {}", p.display()),
            Self::WorkingDirectory(p) => format!("working directory {}", p.display()),
            Self::InstallDirectory(p) => format!("install directory {}", p.display()),
            Self::Empty => "none (empty allow-list)".to_string(),
        }
    }
}

/// A policy together with the source it was read from.
#[derive(Debug, Clone)]
pub struct LoadedPolicy {
    pub config: PolicyConfig,
    pub source: PolicySource,
}

impl PolicyConfig {
    /// Default policy file name looked up in the working and install directories.
    pub const FILE_NAME: &'static str = "config.json";

    /// Environment variable naming an explicit policy file.
    pub const ENV_VAR: &'static str = "CONFLUENCE_MCP_CONFIG";

    pub fn new(
        allowed_spaces: impl IntoIterator<Item = SpaceKey>,
        allowed_parents: impl IntoIterator<Item = (SpaceKey, Vec<PageId>)>,
    ) -> Self {
        Self {
            allowed_spaces: allowed_spaces.into_iter().collect(),
            allowed_parents: allowed_parents
                .into_iter()
                .map(|(space, parents)| (space, parents.into_iter().collect()))
                .collect(),
        }
    }

    /// True when no space is allowed, i.e. every request is denied.
    pub fn is_closed(&self) -> bool {
        self.allowed_spaces.is_empty()
    }

    pub fn parents_for(&self, space: &SpaceKey) -> Option<&BTreeSet<PageId>> {
        self.allowed_parents.get(space)
    }

    /// Parse a policy from JSON
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a policy from YAML
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a policy file, picking the format from the extension (`.yaml` /
    /// `.yml` is YAML, anything else JSON).
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        if Self::is_yaml_path(path) {
            Self::from_yaml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    /// `.yaml` / `.yml` in any case
    pub fn is_yaml_path(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
            .unwrap_or(false)
    }

    /// Candidate sources in precedence order:
    /// 1. explicit path (CLI flag or `CONFLUENCE_MCP_CONFIG`)
    /// 2. `./config.json`
    /// 3. `config.json` in the directory of the running executable
    pub fn candidate_sources(explicit: Option<PathBuf>) -> Vec<PolicySource> {
        let mut candidates = Vec::new();

        if let Some(path) = explicit {
            candidates.push(PolicySource::Explicit(path));
        }

        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(PolicySource::WorkingDirectory(cwd.join(Self::FILE_NAME)));
        }

        if let Some(dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            candidates.push(PolicySource::InstallDirectory(dir.join(Self::FILE_NAME)));
        }

        candidates
    }

    /// Resolve the policy through the standard candidate sources.
    pub fn load_layered(explicit: Option<PathBuf>) -> LoadedPolicy {
        Self::load_first_available(Self::candidate_sources(explicit))
    }

    /// Use the first candidate that exists and parses. Missing, unreadable and
    /// malformed sources are skipped; if none works the policy is empty.
    pub fn load_first_available(candidates: Vec<PolicySource>) -> LoadedPolicy {
        for source in candidates {
            let Some(path) = source.path() else {
                continue;
            };

            if !path.exists() {
                tracing::debug!(path = %path.display(), "Policy file not present, trying next source");
                continue;
            }

            match Self::from_file(path) {
                Ok(config) => {
                    tracing::info!(
                        source = %source.describe(),
                        spaces = config.allowed_spaces.len(),
                        "Loaded allow-list policy"
                    );
                    return LoadedPolicy { config, source };
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Skipping unreadable policy file"
                    );
                }
            }
        }

        tracing::warn!("No policy configuration found. All spaces are denied.");
        LoadedPolicy {
            config: Self::default(),
            source: PolicySource::Empty,
        }
    }

    /// Non-fatal problems worth reporting to an operator.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.allowed_spaces.is_empty() {
            warnings.push("allowed_spaces is empty: every search and mutation will be denied".to_string());
        }

        for (space, parents) in &self.allowed_parents {
            if !self.allowed_spaces.contains(space) {
                warnings.push(format!(
                    "allowed_parents lists space '{}' which is not in allowed_spaces; its parents are unreachable",
                    space
                ));
            }
            if parents.is_empty() {
                warnings.push(format!("allowed_parents for space '{}' is empty", space));
            }
        }

        for space in &self.allowed_spaces {
            if !self.allowed_parents.contains_key(space) {
                warnings.push(format!(
                    "space '{}' has no allowed parents: pages cannot be created there and no subtree is visible",
                    space
                ));
            }
        }

        warnings
    }

    /// Sample document for `config generate`.
    pub fn sample() -> Self {
        Self::new(
            [SpaceKey::from("DOCS")],
            [(SpaceKey::from("DOCS"), vec![PageId::from("123456")])],
        )
    }
}
