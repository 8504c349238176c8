// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! One-shot page commands
//!
//! Each command performs a single tool call through the same dispatcher the
//! MCP server uses and prints the resulting JSON to stdout. A denied or failed
//! call still prints its `{"error": ...}` document, then exits non-zero.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;

use confluence_guard_core::presentation::tools;
use confluence_guard_core::presentation::{ToolDispatcher, ToolOutput};

/// Page body given inline or read from a file
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct BodyArgs {
    /// Body in Confluence storage format
    #[arg(long)]
    pub body: Option<String>,

    /// Read the body from a file
    #[arg(long, value_name = "FILE")]
    pub body_file: Option<PathBuf>,
}

impl BodyArgs {
    pub fn resolve(&self) -> Result<String> {
        match (&self.body, &self.body_file) {
            (Some(body), _) => Ok(body.clone()),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read body from {}", path.display())),
            (None, None) => bail!("Either --body or --body-file is required"),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum PageCommand {
    /// Search pages inside the allow-list
    Search {
        /// Free text, or a CQL fragment
        query: String,
    },

    /// Show a page with its plain-text content
    Page {
        /// Page ID
        page_id: String,
    },

    /// List direct children of a page in an allowed subtree
    Children {
        /// Parent page ID
        page_id: String,
    },

    /// Create a managed page under an allowed parent
    Create {
        /// Space key
        #[arg(long)]
        space: String,

        /// Parent page ID
        #[arg(long)]
        parent: String,

        /// Page title
        #[arg(long)]
        title: String,

        #[command(flatten)]
        body: BodyArgs,
    },

    /// Overwrite the body of a managed page
    Update {
        /// Page ID
        page_id: String,

        #[command(flatten)]
        body: BodyArgs,
    },

    /// Fetch content, labels and version ahead of a merge
    #[command(name = "prepare-merge")]
    PrepareMerge {
        /// Page ID
        page_id: String,
    },
}

impl PageCommand {
    /// Tool name and arguments equivalent to this command.
    pub fn to_tool_call(&self) -> Result<(&'static str, Value)> {
        Ok(match self {
            Self::Search { query } => (tools::SEARCH, json!({ "query": query })),
            Self::Page { page_id } => (tools::GET_PAGE, json!({ "page_id": page_id })),
            Self::Children { page_id } => (tools::GET_CHILDREN, json!({ "page_id": page_id })),
            Self::Create {
                space,
                parent,
                title,
                body,
            } => (
                tools::CREATE_PAGE,
                json!({
                    "space_key": space,
                    "parent_id": parent,
                    "title": title,
                    "body": body.resolve()?,
                }),
            ),
            Self::Update { page_id, body } => (
                tools::UPDATE_PAGE_FULL,
                json!({ "page_id": page_id, "body": body.resolve()? }),
            ),
            Self::PrepareMerge { page_id } => (tools::PREPARE_MERGE_UPDATE, json!({ "page_id": page_id })),
        })
    }
}

pub async fn execute(command: PageCommand, dispatcher: &ToolDispatcher) -> Result<()> {
    let (tool, arguments) = command.to_tool_call()?;
    let ToolOutput { value, is_error } = dispatcher.call(tool, arguments).await;

    println!("{}", serde_json::to_string_pretty(&value)?);

    if is_error {
        bail!("{} did not succeed", tool);
    }
    Ok(())
}
