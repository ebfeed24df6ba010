// Copyright (c) 2026 Hiera Search Maintainers
// SPDX-License-Identifier: AGPL-3.0

//! Facts Staging
//!
//! `puppet lookup` only accepts facts through `--facts <file>`, so each
//! search writes its narrowed console variables to a private, uniquely named
//! JSON file and removes it once the lookup has finished.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** FactsStaging with scoped cleanup
//!
//! [`StagedFactsFile`] owns the file. Dropping it removes the file, so the
//! file cannot outlive the request even when the request future is cancelled
//! or a later stage panics.

use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::domain::error::HieraSearchError;

const FILE_PREFIX: &str = "hiera-facts-";

/// Creates staged facts files inside one shared directory.
#[derive(Debug, Clone)]
pub struct FactsStager {
    dir: PathBuf,
}

impl FactsStager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Serialize `facts` and write it to a fresh file.
    ///
    /// Names carry a random v4 UUID and the file is opened with `create_new`,
    /// so concurrent requests never share or overwrite a file.
    pub async fn stage(&self, facts: &Value) -> Result<StagedFactsFile, HieraSearchError> {
        let path = self
            .dir
            .join(format!("{}{}.json", FILE_PREFIX, Uuid::new_v4().simple()));

        let contents = serde_json::to_vec(facts).map_err(|e| HieraSearchError::StagingFailed {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        tracing::debug!(path = %path.display(), "Creating temp file with Puppet Console variables");

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&path).await.map_err(|e| staging_failed(&path, e))?;

        // From here on the guard owns the path, so a failed write still cleans up
        let staged = StagedFactsFile {
            path,
            removed: false,
        };

        file.write_all(&contents)
            .await
            .map_err(|e| staging_failed(&staged.path, e))?;
        file.flush()
            .await
            .map_err(|e| staging_failed(&staged.path, e))?;

        Ok(staged)
    }
}

fn staging_failed(path: &Path, error: std::io::Error) -> HieraSearchError {
    tracing::error!(path = %path.display(), error = %error, "Failed to stage facts file");
    HieraSearchError::StagingFailed {
        path: path.to_path_buf(),
        reason: error.to_string(),
    }
}

/// A facts file on disk, deleted when this value goes away.
#[derive(Debug)]
pub struct StagedFactsFile {
    path: PathBuf,
    removed: bool,
}

impl StagedFactsFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now. A file that is already gone counts as removed.
    pub async fn remove(mut self) {
        tracing::debug!(path = %self.path.display(), "Deleting temp file");
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Failed to delete temp file");
                // Leave `removed` unset so Drop makes a second attempt
                return;
            }
        }
        self.removed = true;
    }
}

impl Drop for StagedFactsFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Deleted temp file on scope exit");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Failed to delete temp file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_stage_writes_compact_json() {
        let dir = tempfile::tempdir().unwrap();
        let stager = FactsStager::new(dir.path());

        let staged = stager.stage(&json!({"region": "us-east", "tier": 2})).await.unwrap();
        assert!(staged.path().starts_with(dir.path()));

        let written = std::fs::read_to_string(staged.path()).unwrap();
        let parsed: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, json!({"region": "us-east", "tier": 2}));

        staged.remove().await;
    }

    #[tokio::test]
    async fn test_remove_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let staged = FactsStager::new(dir.path()).stage(&json!({})).await.unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());

        staged.remove().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_drop_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let staged = FactsStager::new(dir.path()).stage(&json!({"a": 1})).await.unwrap();
            staged.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_remove_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let staged = FactsStager::new(dir.path()).stage(&json!(null)).await.unwrap();
        std::fs::remove_file(staged.path()).unwrap();
        staged.remove().await;
    }

    #[tokio::test]
    async fn test_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let stager = FactsStager::new(dir.path());

        let mut staged = Vec::new();
        for i in 0..64 {
            staged.push(stager.stage(&json!({"i": i})).await.unwrap());
        }
        let mut paths: Vec<_> = staged.iter().map(|s| s.path().to_path_buf()).collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 64);

        for file in &staged {
            let name = file.path().file_name().unwrap().to_string_lossy().to_string();
            assert!(name.starts_with(FILE_PREFIX));
            assert!(name.ends_with(".json"));
        }
    }

    #[tokio::test]
    async fn test_missing_directory_is_staging_failure() {
        let dir = tempfile::tempdir().unwrap();
        let stager = FactsStager::new(dir.path().join("does-not-exist"));

        let err = stager.stage(&json!({})).await.unwrap_err();
        assert!(matches!(err, HieraSearchError::StagingFailed { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_staged_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let staged = FactsStager::new(dir.path()).stage(&json!({})).await.unwrap();
        let mode = std::fs::metadata(staged.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
