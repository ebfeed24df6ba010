// Copyright (c) 2026 Hiera Search Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Hiera Lookup Domain
//!
//! Describes one run of the resolution tool, how its exit status is
//! classified and how the resolved value is wrapped for the caller.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** LookupTool port, exit-code tiering and ResponseComposer

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::error::HieraSearchError;

/// Highest exit code that still yields usable output. `puppet lookup` exits
/// with 1 when the key has no value.
pub const MAX_NON_FATAL_EXIT_CODE: i32 = 1;

/// Parameters for a single lookup run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupInvocation {
    /// Staged facts document
    pub facts_path: PathBuf,

    /// Normalized branch, passed as the tool's target environment
    pub environment: String,

    pub search_key: String,
}

/// Captured result of a finished lookup process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOutcome {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs the resolution tool.
///
/// Returns `Err` only when the tool could not be started or did not finish
/// in time. A completed run is always `Ok`, whatever its exit code; use
/// [`classify_outcome`] to interpret it.
#[async_trait]
pub trait LookupTool: Send + Sync {
    async fn run(&self, invocation: &LookupInvocation) -> Result<LookupOutcome, HieraSearchError>;
}

/// Pre-rendered value produced by the resolution tool.
///
/// The text is kept exactly as the tool printed it (minus the trailing
/// newline) and is never parsed or re-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue(String);

impl ResolvedValue {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final response body: `{"resultValue": <raw>}`.
    ///
    /// Built by concatenation so the tool's JSON rendering survives
    /// byte-for-byte.
    pub fn to_envelope(&self) -> String {
        format!("{{\"resultValue\": {}}}", self.0)
    }
}

/// Apply the exit-code tiers to a finished run.
///
/// * `0` / `1` with output: the output, one trailing newline removed
/// * `0` / `1` without output: [`HieraSearchError::LookupKeyNotFound`]
/// * `>= 2`, negative or killed by a signal: [`HieraSearchError::LookupToolError`]
pub fn classify_outcome(
    outcome: LookupOutcome,
    search_key: &str,
) -> Result<ResolvedValue, HieraSearchError> {
    let fatal = match outcome.exit_code {
        Some(code) => !(0..=MAX_NON_FATAL_EXIT_CODE).contains(&code),
        None => true,
    };

    if fatal {
        return Err(HieraSearchError::LookupToolError {
            search_key: search_key.to_string(),
            exit_code: outcome.exit_code,
            detail: outcome.stderr,
        });
    }

    if outcome.stdout.is_empty() {
        return Err(HieraSearchError::LookupKeyNotFound(search_key.to_string()));
    }

    let raw = strip_trailing_newline(&outcome.stdout);
    if raw.trim().is_empty() {
        return Err(HieraSearchError::LookupKeyNotFound(search_key.to_string()));
    }

    Ok(ResolvedValue::new(raw))
}

fn strip_trailing_newline(text: &str) -> &str {
    match text.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => text,
    }
}
