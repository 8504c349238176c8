// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application
//!
//! Use cases orchestrating the platform port and the access gate.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Implements the content gateway operations

pub mod content_gateway;

pub use content_gateway::{ContentGateway, GatewayError};
