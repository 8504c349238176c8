// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure
//!
//! Adapters behind the domain ports.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Confluence REST client, in-memory platform, storage-to-text projection

pub mod confluence;
pub mod in_memory_platform;
pub mod storage_text;
