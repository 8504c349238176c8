// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Tool surface
//!
//! Names, descriptions and input schemas of the six gateway tools, and the
//! dispatcher turning a `(name, arguments)` call into a JSON result. A result
//! is either the success payload or `{"error": "..."}`, never both, so an
//! agent can always render the outcome as text.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::application::content_gateway::{ContentGateway, GatewayError};
use crate::domain::page::{PageId, SpaceKey};

pub const SEARCH: &str = "search_confluence";
pub const GET_PAGE: &str = "get_confluence_page";
pub const CREATE_PAGE: &str = "create_confluence_page";
pub const UPDATE_PAGE_FULL: &str = "update_confluence_page_full";
pub const PREPARE_MERGE_UPDATE: &str = "prepare_confluence_page_merge_update";
pub const GET_CHILDREN: &str = "get_confluence_children";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

#[derive(Debug, Deserialize)]
struct PageArgs {
    page_id: PageId,
}

#[derive(Debug, Deserialize)]
struct CreateArgs {
    space_key: SpaceKey,
    parent_id: PageId,
    title: String,
    body: String,
}

#[derive(Debug, Deserialize)]
struct UpdateArgs {
    page_id: PageId,
    body: String,
}

fn object_schema(properties: &[(&str, &str)]) -> Value {
    let props: serde_json::Map<String, Value> = properties
        .iter()
        .map(|(name, description)| {
            (
                name.to_string(),
                json!({"type": "string", "description": description}),
            )
        })
        .collect();
    let required: Vec<&str> = properties.iter().map(|(name, _)| *name).collect();

    json!({
        "type": "object",
        "properties": props,
        "required": required,
    })
}

/// Definitions advertised by `tools/list`
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: SEARCH,
            description: "Search for Confluence pages using CQL. Returns pages only from allowed spaces and \
                          within allowed parent hierarchies; descendants of an allowed parent are included.",
            input_schema: object_schema(&[(
                "query",
                "Free text, or a CQL fragment when it contains '=' or ' in '",
            )]),
        },
        ToolDefinition {
            name: GET_PAGE,
            description: "Get a Confluence page by ID, returning plain text content and storage markup.",
            input_schema: object_schema(&[("page_id", "Confluence page ID")]),
        },
        ToolDefinition {
            name: CREATE_PAGE,
            description: "Create a new Confluence page directly under an allowed parent page. \
                          The page is automatically labelled 'ai-managed'.",
            input_schema: object_schema(&[
                ("space_key", "Key of an allowed space"),
                ("parent_id", "ID of an allowed parent page"),
                ("title", "Page title"),
                ("body", "Page body in Confluence storage format"),
            ]),
        },
        ToolDefinition {
            name: UPDATE_PAGE_FULL,
            description: "Overwrite a Confluence page's body. Only allowed for pages in an allowed space \
                          and subtree that carry the 'ai-generated' or 'ai-managed' label.",
            input_schema: object_schema(&[
                ("page_id", "Confluence page ID"),
                ("body", "New page body in Confluence storage format"),
            ]),
        },
        ToolDefinition {
            name: PREPARE_MERGE_UPDATE,
            description: "Retrieve page content, labels and version for merging. Enforces the same access \
                          control as updates.",
            input_schema: object_schema(&[("page_id", "Confluence page ID")]),
        },
        ToolDefinition {
            name: GET_CHILDREN,
            description: "Get direct child pages of a page inside an allowed hierarchy. Useful for \
                          navigating when search is unreliable.",
            input_schema: object_schema(&[("page_id", "Confluence page ID")]),
        },
    ]
}

/// Result of one tool call
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub value: Value,
    pub is_error: bool,
}

impl ToolOutput {
    fn success(value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => Self {
                value,
                is_error: false,
            },
            Err(e) => Self::error(format!("Failed to serialize result: {}", e)),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            value: json!({ "error": message.into() }),
            is_error: true,
        }
    }

    fn from_result<T: Serialize>(result: Result<T, GatewayError>) -> Self {
        match result {
            Ok(value) => Self::success(value),
            Err(e) => Self::error(e.to_string()),
        }
    }
}

pub struct ToolDispatcher {
    gateway: Arc<ContentGateway>,
}

impl ToolDispatcher {
    pub fn new(gateway: Arc<ContentGateway>) -> Self {
        Self { gateway }
    }

    pub async fn call(&self, name: &str, arguments: Value) -> ToolOutput {
        tracing::debug!(tool = name, "Dispatching tool call");

        match name {
            SEARCH => match parse_args::<SearchArgs>(name, arguments) {
                Ok(args) => ToolOutput::from_result(self.gateway.search(&args.query).await),
                Err(output) => output,
            },
            GET_PAGE => match parse_args::<PageArgs>(name, arguments) {
                Ok(args) => ToolOutput::from_result(self.gateway.get_page(&args.page_id).await),
                Err(output) => output,
            },
            CREATE_PAGE => match parse_args::<CreateArgs>(name, arguments) {
                Ok(args) => ToolOutput::from_result(
                    self.gateway
                        .create_page(&args.space_key, &args.parent_id, &args.title, &args.body)
                        .await,
                ),
                Err(output) => output,
            },
            UPDATE_PAGE_FULL => match parse_args::<UpdateArgs>(name, arguments) {
                Ok(args) => ToolOutput::from_result(self.gateway.update_full_page(&args.page_id, &args.body).await),
                Err(output) => output,
            },
            PREPARE_MERGE_UPDATE => match parse_args::<PageArgs>(name, arguments) {
                Ok(args) => ToolOutput::from_result(self.gateway.prepare_merge_update(&args.page_id).await),
                Err(output) => output,
            },
            GET_CHILDREN => match parse_args::<PageArgs>(name, arguments) {
                Ok(args) => ToolOutput::from_result(self.gateway.list_children(&args.page_id).await),
                Err(output) => output,
            },
            unknown => ToolOutput::error(format!("Unknown tool: {}", unknown)),
        }
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolOutput> {
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    serde_json::from_value(arguments)
        .map_err(|e| ToolOutput::error(format!("Invalid arguments for {}: {}", tool, e)))
}
