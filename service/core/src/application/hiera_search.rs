// Copyright (c) 2026 Hiera Search Maintainers
// SPDX-License-Identifier: AGPL-3.0

//! Hiera Search Use Case
//!
//! Drives one search through the five pipeline stages:
//!
//! 1. fetch the classifier topology
//! 2. narrow it to the requested node group's console variables
//! 3. stage those variables as a facts file
//! 4. run `puppet lookup` against the branch environment
//! 5. classify the exit status into a resolved value or an error
//!
//! Stages run strictly in order and every request re-fetches and re-resolves.
//! The staged facts file is removed before this function returns on every
//! path, and by its guard when the future is dropped mid-flight.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Pipeline orchestration

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::domain::classifier::{narrow_facts, ClassifierClient};
use crate::domain::error::HieraSearchError;
use crate::domain::lookup::{classify_outcome, LookupInvocation, LookupTool, ResolvedValue};
use crate::domain::query::HieraQuery;
use crate::domain::service_config::ServiceConfigSpec;
use crate::infrastructure::classifier_client::PuppetClassifierClient;
use crate::infrastructure::facts_staging::FactsStager;
use crate::infrastructure::puppet_lookup::PuppetLookupCommand;

pub struct HieraSearchService {
    classifier: Arc<dyn ClassifierClient>,
    lookup_tool: Arc<dyn LookupTool>,
    stager: FactsStager,
}

impl HieraSearchService {
    pub fn new(
        classifier: Arc<dyn ClassifierClient>,
        lookup_tool: Arc<dyn LookupTool>,
        stager: FactsStager,
    ) -> Self {
        Self {
            classifier,
            lookup_tool,
            stager,
        }
    }

    /// Wire the production adapters. Loads the classifier client identity.
    pub fn from_config(spec: &ServiceConfigSpec) -> Result<Self> {
        let classifier = PuppetClassifierClient::from_config(&spec.classifier)
            .context("Failed to initialize Puppet Classifier client")?;
        let lookup_tool = PuppetLookupCommand::from_config(&spec.lookup);
        let stager = FactsStager::new(spec.lookup.staging_dir());

        Ok(Self::new(Arc::new(classifier), Arc::new(lookup_tool), stager))
    }

    #[tracing::instrument(
        name = "hiera_search",
        skip_all,
        fields(
            environment = %query.environment(),
            branch = %query.branch(),
            search_key = %query.search_key(),
        )
    )]
    pub async fn search(&self, query: &HieraQuery) -> Result<ResolvedValue, HieraSearchError> {
        let result = self.run_pipeline(query).await;

        match &result {
            Ok(value) => tracing::info!(
                "Puppet lookup returned from \"{}\" query: {}",
                query.search_key(),
                value.as_str()
            ),
            Err(e) if e.is_not_found() => tracing::warn!(kind = e.kind(), "{}", e),
            Err(HieraSearchError::LookupToolError { exit_code, detail, .. }) => {
                tracing::error!(kind = "lookup_tool_error", exit_code = ?exit_code, "Puppet lookup error: {}", detail)
            }
            Err(e) => tracing::error!(kind = e.kind(), "{}", e),
        }

        result
    }

    async fn run_pipeline(&self, query: &HieraQuery) -> Result<ResolvedValue, HieraSearchError> {
        let puppet_environment = query.puppet_environment();

        tracing::debug!("Fetching classifier topology");
        let topology = self.classifier.fetch_topology().await?;

        tracing::debug!("Begin filter on classifier topology for environment {}", query.environment());
        let facts = narrow_facts(&topology, query.environment())?;
        tracing::info!(
            "Puppet Console Variables for environment {}: {}",
            query.environment(),
            facts
        );

        let staged = self.stager.stage(&facts).await?;

        let invocation = LookupInvocation {
            facts_path: staged.path().to_path_buf(),
            environment: puppet_environment,
            search_key: query.search_key().to_string(),
        };
        let outcome = self.lookup_tool.run(&invocation).await;

        staged.remove().await;

        classify_outcome(outcome?, query.search_key())
    }
}
