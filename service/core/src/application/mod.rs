// Copyright (c) 2026 Hiera Search Maintainers
// SPDX-License-Identifier: AGPL-3.0

pub mod hiera_search;

pub use hiera_search::HieraSearchService;
