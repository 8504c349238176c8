// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Identifiers, page models, the allow-list policy and the platform port.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure policy and query logic, free of network I/O

pub mod page;
pub mod policy;
pub mod access_gate;
pub mod query;
pub mod result_filter;
pub mod platform;
