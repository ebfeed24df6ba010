// Copyright (c) 2026 Hiera Search Maintainers
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Hiera Search CLI

pub mod config;
pub mod lookup;
pub mod serve;

pub use self::config::ConfigCommand;
pub use self::lookup::LookupArgs;
