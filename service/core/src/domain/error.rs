// Copyright (c) 2026 Hiera Search Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Search Error Taxonomy
//!
//! Every way a single Hiera search can terminate early. Only
//! [`HieraSearchError::LookupKeyNotFound`] is meaningful to the caller as
//! "no such data"; everything else is a server-side fault.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Classified pipeline failures

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HieraSearchError {
    /// Transport failure, timeout or non-success status from the classifier.
    #[error("Puppet Classifier query returned with error or timed out: {0}")]
    UpstreamUnavailable(String),

    #[error("Puppet Classifier result returned empty string")]
    UpstreamEmptyResponse,

    #[error("Puppet Classifier result could not be parsed: {0}")]
    UpstreamMalformed(String),

    /// No classifier group carries the requested name.
    #[error(
        "Puppet Classifier result returned no values while trying to match on filter, \
         check for valid environment name: {0}"
    )]
    EnvironmentNotFound(String),

    #[error("Failed to stage facts file {path:?}: {reason}")]
    StagingFailed { path: PathBuf, reason: String },

    /// `puppet lookup` could not run to completion or exited with code >= 2.
    /// `detail` holds stderr (or the spawn/timeout failure) and never reaches
    /// the HTTP response.
    #[error("Puppet lookup error on {search_key}")]
    LookupToolError {
        search_key: String,
        exit_code: Option<i32>,
        detail: String,
    },

    #[error("Puppet lookup CMD returned null or empty string, use valid puppet Hiera key: {0}")]
    LookupKeyNotFound(String),
}

impl HieraSearchError {
    /// True for the single outcome surfaced as "not found" rather than as a
    /// server fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::LookupKeyNotFound(_))
    }

    /// Stable short name used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::UpstreamEmptyResponse => "upstream_empty_response",
            Self::UpstreamMalformed(_) => "upstream_malformed",
            Self::EnvironmentNotFound(_) => "environment_not_found",
            Self::StagingFailed { .. } => "staging_failed",
            Self::LookupToolError { .. } => "lookup_tool_error",
            Self::LookupKeyNotFound(_) => "lookup_key_not_found",
        }
    }
}
