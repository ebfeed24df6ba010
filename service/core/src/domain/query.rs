// Copyright (c) 2026 Hiera Search Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Hiera Query
//!
//! The validated input of one search and the branch naming rule that maps a
//! human-readable release branch onto a Puppet Code Manager environment.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Input model and BranchNormalizer

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Missing required query field: {0}")]
    MissingField(&'static str),
}

/// Convert a release branch (`2022.4.1`) to the Code Manager environment
/// name (`2022_4_1`). Periods are the only characters touched.
pub fn normalize_branch(branch: &str) -> String {
    branch.replace('.', "_")
}

/// Immutable, validated search request. Only [`HieraQuery::new`] builds one.
///
/// `branch` holds the caller's spelling; use [`HieraQuery::puppet_environment`]
/// for the value handed to `puppet lookup --environment`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HieraQuery {
    /// Node group name in the classifier
    environment: String,

    /// Git branch / Puppet environment, dot-separated
    branch: String,

    /// Hiera key, e.g. `profile::app::setting`
    search_key: String,
}

impl HieraQuery {
    pub fn new(
        environment: impl Into<String>,
        branch: impl Into<String>,
        search_key: impl Into<String>,
    ) -> Result<Self, QueryError> {
        let environment = environment.into();
        let branch = branch.into();
        let search_key = search_key.into();

        if environment.trim().is_empty() {
            return Err(QueryError::MissingField("environment"));
        }
        if branch.trim().is_empty() {
            return Err(QueryError::MissingField("branch"));
        }
        if search_key.trim().is_empty() {
            return Err(QueryError::MissingField("hierasearchkey"));
        }

        Ok(Self {
            environment,
            branch,
            search_key,
        })
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn search_key(&self) -> &str {
        &self.search_key
    }

    pub fn puppet_environment(&self) -> String {
        normalize_branch(&self.branch)
    }
}
