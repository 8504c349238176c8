// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Confluence Guard core
//!
//! Mediates agent access to a Confluence site behind a static allow-list of
//! spaces and parent pages.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Policy, CQL scoping, result filtering and the content gateway

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
