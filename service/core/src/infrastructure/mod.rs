// Copyright (c) 2026 Hiera Search Maintainers
// SPDX-License-Identifier: AGPL-3.0

pub mod classifier_client;
pub mod facts_staging;
pub mod puppet_lookup;

pub use classifier_client::PuppetClassifierClient;
pub use facts_staging::{FactsStager, StagedFactsFile};
pub use puppet_lookup::PuppetLookupCommand;
