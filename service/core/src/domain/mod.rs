// Copyright (c) 2026 Hiera Search Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Query model, error taxonomy and the pure stages of the search pipeline.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Types and rules with no I/O

pub mod classifier;
pub mod error;
pub mod lookup;
pub mod query;
pub mod service_config;
