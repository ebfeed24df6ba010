// Copyright (c) 2026 Hiera Search Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Hiera Search Core
//!
//! Resolves a Hiera key for a Puppet node group and code branch by chaining
//! the node classifier, a staged facts document and `puppet lookup`.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain types, the search pipeline, its adapters and the HTTP surface

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
