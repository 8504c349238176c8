// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `confluence-guard serve`: run the MCP server on stdin/stdout until the
//! client closes its end.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use confluence_guard_core::presentation::McpServer;

use crate::connection::{build_dispatcher, ConnectionArgs};

pub async fn execute(connection: &ConnectionArgs, config: Option<PathBuf>) -> Result<()> {
    let dispatcher = build_dispatcher(connection, config)?;
    let server = McpServer::new(Arc::new(dispatcher));

    server
        .run_stdio()
        .await
        .context("MCP stdio transport failed")
}
