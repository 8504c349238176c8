// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Confluence connection settings and gateway wiring
//!
//! Connection values come from flags or the `CONFLUENCE_*` environment
//! variables (a `.env` file is loaded before parsing). The allow-list policy is
//! resolved separately through the usual discovery order.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use confluence_guard_core::application::content_gateway::ContentGateway;
use confluence_guard_core::domain::policy::{LoadedPolicy, PolicyConfig};
use confluence_guard_core::infrastructure::confluence::{ConfluenceClient, ConfluenceSettings};
use confluence_guard_core::presentation::ToolDispatcher;

#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Confluence site URL, e.g. https://example.atlassian.net/wiki
    #[arg(long, global = true, env = "CONFLUENCE_BASE_URL", value_name = "URL")]
    pub base_url: Option<String>,

    /// Account email used for basic authentication
    #[arg(long, global = true, env = "CONFLUENCE_EMAIL")]
    pub email: Option<String>,

    /// API token used for basic authentication
    #[arg(long, global = true, env = "CONFLUENCE_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "CONFLUENCE_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl ConnectionArgs {
    pub fn settings(&self) -> Result<ConfluenceSettings> {
        let base_url = required(&self.base_url, "CONFLUENCE_BASE_URL")?;
        let email = required(&self.email, "CONFLUENCE_EMAIL")?;
        let api_token = required(&self.api_token, "CONFLUENCE_API_TOKEN")?;

        Ok(ConfluenceSettings::new(base_url, email, api_token)
            .with_timeout(Duration::from_secs(self.timeout_secs)))
    }
}

fn required<'a>(value: &'a Option<String>, var: &str) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .with_context(|| format!("{} is not set (pass the flag or export the variable)", var))
}

/// Resolve the policy and build a tool dispatcher over the Confluence client.
pub fn build_dispatcher(connection: &ConnectionArgs, config: Option<PathBuf>) -> Result<ToolDispatcher> {
    let settings = connection.settings()?;
    let LoadedPolicy { config, source } = PolicyConfig::load_layered(config);

    tracing::info!(
        base_url = %settings.base_url,
        policy_source = %source.describe(),
        spaces = config.allowed_spaces.len(),
        "Connecting gateway"
    );
    for warning in config.warnings() {
        tracing::warn!("{}", warning);
    }

    let client = ConfluenceClient::new(settings).context("Failed to create Confluence client")?;
    let gateway = ContentGateway::new(Arc::new(client), Arc::new(config));
    Ok(ToolDispatcher::new(Arc::new(gateway)))
}
