// Copyright (c) 2026 Hiera Search Maintainers
// SPDX-License-Identifier: AGPL-3.0
//! Node Classifier Domain
//!
//! The port through which the pipeline fetches the classifier topology, and
//! the EnvironmentFilter that narrows that topology to one node group's
//! console variables.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** ClassifierClient trait and topology narrowing

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::error::HieraSearchError;

/// Fetches the raw `groups` document from the node classifier.
///
/// Implementations return the body text only for a successful, non-empty
/// response; everything else is an `Upstream*` error.
#[async_trait]
pub trait ClassifierClient: Send + Sync {
    async fn fetch_topology(&self) -> Result<String, HieraSearchError>;
}

/// Select the `variables` of the first group whose `name` equals
/// `environment` (exact, case-sensitive).
///
/// The returned value is whatever the classifier stored; its shape is not
/// checked here.
pub fn narrow_facts(topology: &str, environment: &str) -> Result<Value, HieraSearchError> {
    let parsed: Value = serde_json::from_str(topology)
        .map_err(|e| HieraSearchError::UpstreamMalformed(e.to_string()))?;

    let groups = parsed.as_array().ok_or_else(|| {
        HieraSearchError::UpstreamMalformed(format!(
            "expected a JSON array of groups, found {}",
            json_type_name(&parsed)
        ))
    })?;

    let matches = matching_variables(groups, environment);

    tracing::debug!(
        environment = %environment,
        groups = groups.len(),
        matches = matches.len(),
        "Filtered classifier groups"
    );
    if matches.len() > 1 {
        tracing::warn!(
            environment = %environment,
            matches = matches.len(),
            "Multiple classifier groups share this name, using the first"
        );
    }

    let first = matches.first().map(|variables| (*variables).clone());
    first.ok_or_else(|| HieraSearchError::EnvironmentNotFound(environment.to_string()))
}

/// `variables` of every group named `environment`, in document order.
fn matching_variables<'a>(groups: &'a [Value], environment: &str) -> Vec<&'a Value> {
    groups
        .iter()
        .filter_map(|group| {
            let group = group.as_object()?;
            match group.get("name").and_then(Value::as_str) {
                Some(name) if name == environment => group.get("variables"),
                _ => None,
            }
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
