// Copyright (c) 2026 Hiera Search Maintainers
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use hiera_core::application::hiera_search::HieraSearchService;
use hiera_core::domain::classifier::ClassifierClient;
use hiera_core::domain::error::HieraSearchError;
use hiera_core::domain::lookup::{LookupInvocation, LookupOutcome, LookupTool};
use hiera_core::domain::query::HieraQuery;
use hiera_core::infrastructure::facts_staging::FactsStager;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TOPOLOGY: &str = r#"[
    {"name": "All Nodes", "variables": {}},
    {"name": "prod", "variables": {"region": "eu-west"}},
    {"name": "dev", "variables": {"region": "us-east"}}
]"#;

struct StaticClassifier(String);

#[async_trait]
impl ClassifierClient for StaticClassifier {
    async fn fetch_topology(&self) -> Result<String, HieraSearchError> {
        Ok(self.0.clone())
    }
}

/// Records the staged path and the facts it contained, then returns a fixed
/// outcome.
struct ScriptedLookup {
    outcome: LookupOutcome,
    seen: Mutex<Vec<(LookupInvocation, Value)>>,
}

impl ScriptedLookup {
    fn new(exit_code: i32, stdout: &str, stderr: &str) -> Self {
        Self {
            outcome: LookupOutcome {
                exit_code: Some(exit_code),
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
            seen: Mutex::new(Vec::new()),
        }
    }

    fn seen(&self) -> Vec<(LookupInvocation, Value)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl LookupTool for ScriptedLookup {
    async fn run(&self, invocation: &LookupInvocation) -> Result<LookupOutcome, HieraSearchError> {
        let facts: Value =
            serde_json::from_str(&std::fs::read_to_string(&invocation.facts_path).unwrap()).unwrap();
        self.seen.lock().unwrap().push((invocation.clone(), facts));
        Ok(self.outcome.clone())
    }
}

/// Prints the staged `region` fact as the resolved value, after a short
/// pause so concurrent searches overlap.
struct EchoRegionLookup;

#[async_trait]
impl LookupTool for EchoRegionLookup {
    async fn run(&self, invocation: &LookupInvocation) -> Result<LookupOutcome, HieraSearchError> {
        let facts: Value =
            serde_json::from_str(&std::fs::read_to_string(&invocation.facts_path).unwrap()).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(LookupOutcome {
            exit_code: Some(0),
            stdout: format!("{}\n", facts["region"]),
            stderr: String::new(),
        })
    }
}

#[derive(Clone, Copy)]
enum Failure {
    Error,
    Panic,
    Hang,
}

struct FailingLookup {
    failure: Failure,
    staged_path: Arc<Mutex<Option<PathBuf>>>,
}

#[async_trait]
impl LookupTool for FailingLookup {
    async fn run(&self, invocation: &LookupInvocation) -> Result<LookupOutcome, HieraSearchError> {
        assert!(invocation.facts_path.exists(), "facts must be on disk while the tool runs");
        *self.staged_path.lock().unwrap() = Some(invocation.facts_path.clone());

        match self.failure {
            Failure::Error => Err(HieraSearchError::LookupToolError {
                search_key: invocation.search_key.clone(),
                exit_code: None,
                detail: "injected failure".to_string(),
            }),
            Failure::Panic => panic!("injected panic after staging"),
            Failure::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

fn service_with(lookup: Arc<dyn LookupTool>, dir: &std::path::Path) -> HieraSearchService {
    HieraSearchService::new(
        Arc::new(StaticClassifier(TOPOLOGY.to_string())),
        lookup,
        FactsStager::new(dir),
    )
}

fn remaining_files(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[tokio::test]
async fn test_end_to_end_dev_branch_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let lookup = Arc::new(ScriptedLookup::new(0, "\"us-east-value\"\n", ""));
    let service = service_with(lookup.clone(), dir.path());

    let query = HieraQuery::new("dev", "2022.4", "profile::app::setting").unwrap();
    let value = service.search(&query).await.unwrap();

    assert_eq!(value.to_envelope(), r#"{"resultValue": "us-east-value"}"#);

    let seen = lookup.seen();
    assert_eq!(seen.len(), 1);
    let (invocation, facts) = &seen[0];
    assert_eq!(invocation.environment, "2022_4");
    assert_eq!(invocation.search_key, "profile::app::setting");
    assert_eq!(facts, &serde_json::json!({"region": "us-east"}));
    assert!(invocation.facts_path.starts_with(dir.path()));
    assert!(!invocation.facts_path.exists());
    assert_eq!(remaining_files(dir.path()), 0);
}

#[tokio::test]
async fn test_identical_searches_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let lookup = Arc::new(ScriptedLookup::new(0, "{\"a\":[1,2]}\n", ""));
    let service = service_with(lookup.clone(), dir.path());
    let query = HieraQuery::new("prod", "2023.1", "profile::list").unwrap();

    let first = service.search(&query).await.unwrap();
    let second = service.search(&query).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.to_envelope(), r#"{"resultValue": {"a":[1,2]}}"#);

    // Each run stages its own file
    let seen = lookup.seen();
    assert_eq!(seen.len(), 2);
    assert_ne!(seen[0].0.facts_path, seen[1].0.facts_path);
}

#[tokio::test]
async fn test_missing_key_is_not_found_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with(Arc::new(ScriptedLookup::new(1, "", "")), dir.path());
    let query = HieraQuery::new("dev", "2022.4", "profile::missing").unwrap();

    let err = service.search(&query).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(remaining_files(dir.path()), 0);
}

#[tokio::test]
async fn test_fatal_exit_is_tool_error_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_with(
        Arc::new(ScriptedLookup::new(2, "", "Error: Could not find environment '2022_9'")),
        dir.path(),
    );
    let query = HieraQuery::new("dev", "2022.9", "profile::app::setting").unwrap();

    let err = service.search(&query).await.unwrap_err();
    match err {
        HieraSearchError::LookupToolError { exit_code, detail, .. } => {
            assert_eq!(exit_code, Some(2));
            assert!(detail.contains("2022_9"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(remaining_files(dir.path()), 0);
}

#[tokio::test]
async fn test_injected_error_after_staging_removes_file() {
    let dir = tempfile::tempdir().unwrap();
    let staged_path = Arc::new(Mutex::new(None));
    let lookup = Arc::new(FailingLookup {
        failure: Failure::Error,
        staged_path: staged_path.clone(),
    });
    let service = service_with(lookup, dir.path());
    let query = HieraQuery::new("dev", "2022.4", "k").unwrap();

    assert!(service.search(&query).await.is_err());

    let path = staged_path.lock().unwrap().clone().unwrap();
    assert!(!path.exists());
}

#[tokio::test]
async fn test_panic_after_staging_removes_file() {
    let dir = tempfile::tempdir().unwrap();
    let staged_path = Arc::new(Mutex::new(None));
    let lookup = Arc::new(FailingLookup {
        failure: Failure::Panic,
        staged_path: staged_path.clone(),
    });
    let service = Arc::new(service_with(lookup, dir.path()));

    let task = tokio::spawn({
        let service = service.clone();
        async move {
            let query = HieraQuery::new("dev", "2022.4", "k").unwrap();
            service.search(&query).await
        }
    });
    assert!(task.await.unwrap_err().is_panic());

    let path = staged_path.lock().unwrap().clone().unwrap();
    assert!(!path.exists());
}

#[tokio::test]
async fn test_cancelled_search_removes_file() {
    let dir = tempfile::tempdir().unwrap();
    let staged_path = Arc::new(Mutex::new(None));
    let lookup = Arc::new(FailingLookup {
        failure: Failure::Hang,
        staged_path: staged_path.clone(),
    });
    let service = service_with(lookup, dir.path());
    let query = HieraQuery::new("dev", "2022.4", "k").unwrap();

    let result = tokio::time::timeout(Duration::from_millis(100), service.search(&query)).await;
    assert!(result.is_err(), "search should have been cancelled");

    let path = staged_path.lock().unwrap().clone().unwrap();
    assert!(!path.exists());
    assert_eq!(remaining_files(dir.path()), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_searches_do_not_share_facts() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(service_with(Arc::new(EchoRegionLookup), dir.path()));

    let mut handles = Vec::new();
    for i in 0..16 {
        let service = service.clone();
        let (environment, expected) = if i % 2 == 0 {
            ("dev", "\"us-east\"")
        } else {
            ("prod", "\"eu-west\"")
        };
        handles.push(tokio::spawn(async move {
            let query = HieraQuery::new(environment, "2022.4", "profile::region").unwrap();
            let value = service.search(&query).await.unwrap();
            assert_eq!(value.as_str(), expected, "cross-contaminated facts for {environment}");
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(remaining_files(dir.path()), 0);
}
