// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Presentation
//!
//! The agent-facing surface: tool definitions, dispatch and the MCP stdio
//! transport.
//!
//! # Architecture
//!
//! - **Layer:** Presentation Layer
//! - **Purpose:** Adapts gateway operations to MCP tool calls

pub mod mcp_server;
pub mod protocol;
pub mod tools;

pub use mcp_server::McpServer;
pub use tools::{ToolDispatcher, ToolOutput};
