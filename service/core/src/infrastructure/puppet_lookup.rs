// Copyright (c) 2026 Hiera Search Maintainers
// SPDX-License-Identifier: AGPL-3.0

//! `puppet lookup` Adapter
//!
//! Runs `puppet lookup` against a staged facts file and captures its exit
//! code, stdout and stderr. Exit-code interpretation lives in the domain
//! (`classify_outcome`); this adapter only fails when the process cannot be
//! started or does not finish in time.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** LookupInvoker subprocess adapter

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::domain::error::HieraSearchError;
use crate::domain::lookup::{LookupInvocation, LookupOutcome, LookupTool};
use crate::domain::service_config::LookupConfig;

pub struct PuppetLookupCommand {
    binary: PathBuf,
    timeout: Duration,
}

impl PuppetLookupCommand {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn from_config(config: &LookupConfig) -> Self {
        Self::new(config.puppet_binary.clone(), config.timeout())
    }

    /// Argument vector for one lookup:
    /// deep merge, hash-array concatenation, JSON rendering, the normalized
    /// branch as environment, the staged facts, and the key last.
    pub fn arguments(invocation: &LookupInvocation) -> Vec<OsString> {
        vec![
            "lookup".into(),
            "--merge".into(),
            "deep".into(),
            "--merge-hash-arrays".into(),
            "--render-as".into(),
            "json".into(),
            "--environment".into(),
            invocation.environment.clone().into(),
            "--facts".into(),
            invocation.facts_path.clone().into_os_string(),
            invocation.search_key.clone().into(),
        ]
    }
}

#[async_trait]
impl LookupTool for PuppetLookupCommand {
    async fn run(&self, invocation: &LookupInvocation) -> Result<LookupOutcome, HieraSearchError> {
        tracing::debug!(
            binary = %self.binary.display(),
            environment = %invocation.environment,
            facts = %invocation.facts_path.display(),
            search_key = %invocation.search_key,
            "Executing Puppet lookup CMD"
        );

        let mut cmd = Command::new(&self.binary);
        cmd.args(Self::arguments(invocation))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let tool_error = |exit_code: Option<i32>, detail: String| HieraSearchError::LookupToolError {
            search_key: invocation.search_key.clone(),
            exit_code,
            detail,
        };

        let child = cmd.spawn().map_err(|e| {
            tracing::error!(binary = %self.binary.display(), error = %e, "Failed to start Puppet lookup");
            tool_error(None, format!("failed to start {}: {}", self.binary.display(), e))
        })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Puppet lookup did not complete");
                return Err(tool_error(None, e.to_string()));
            }
            Err(_) => {
                // The child future was dropped, kill_on_drop terminates the process
                tracing::error!(timeout = ?self.timeout, "Puppet lookup timed out");
                return Err(tool_error(None, format!("timed out after {:?}", self.timeout)));
            }
        };

        let outcome = LookupOutcome {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        tracing::debug!(exit_code = ?outcome.exit_code, "Puppet lookup finished");
        Ok(outcome)
    }
}
