//! Content snapshots used to find the files a fix pass really changed.
//!
//! The fixer's own claim about what it touched is never used for staging;
//! the before/after digests computed here are.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::Repository;
use crate::path::normalize;

/// Digests of a set of files at one point in time.
///
/// `None` marks a file that did not exist when the snapshot was taken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSnapshot {
    pub entries: BTreeMap<PathBuf, Option<String>>,

    /// Files that could not be read while capturing.
    pub errors: BTreeMap<PathBuf, String>,
}

impl FileSnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Files whose content differs from a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifiedFiles {
    /// Changed files, sorted.
    pub modified: Vec<PathBuf>,

    /// Files that could not be re-read.
    pub errors: BTreeMap<PathBuf, String>,
}

/// SHA-256 of the file, `None` when it does not exist.
async fn content_digest(path: &Path) -> Result<Option<String>, String> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(hex::encode(Sha256::digest(&bytes)))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.to_string()),
    }
}

impl Repository {
    /// Record the current content digest of each file.
    pub async fn capture_file_states<P: AsRef<Path>>(&self, files: &[P]) -> FileSnapshot {
        let mut snapshot = FileSnapshot::default();
        let mut targets = Vec::new();

        for file in files {
            match normalize(file, Some(&self.root)) {
                Ok(path) => targets.push(path),
                Err(e) => {
                    snapshot
                        .errors
                        .insert(file.as_ref().to_path_buf(), e.to_string());
                }
            }
        }

        let digests = self
            .executor
            .run_all(targets.clone(), |path| async move { content_digest(&path).await })
            .await;

        for (path, digest) in targets.into_iter().zip(digests) {
            match digest {
                Ok(Ok(digest)) => {
                    snapshot.entries.insert(path, digest);
                }
                Ok(Err(reason)) => {
                    snapshot.errors.insert(path, reason);
                }
                Err(e) => {
                    snapshot.errors.insert(path, e.to_string());
                }
            }
        }

        debug!(
            files = snapshot.entries.len(),
            errors = snapshot.errors.len(),
            "captured file states"
        );
        snapshot
    }

    /// Compare current content against `snapshot`.
    ///
    /// When `only` is given, just those snapshotted files are compared.
    /// Files deleted since the snapshot are skipped; read errors are
    /// collected rather than aborting the pass.
    pub async fn detect_modified_files(
        &self,
        snapshot: &FileSnapshot,
        only: Option<&[PathBuf]>,
    ) -> ModifiedFiles {
        let selected: Vec<(PathBuf, Option<String>)> = match only {
            Some(filter) => {
                let wanted: Vec<PathBuf> = filter
                    .iter()
                    .filter_map(|p| normalize(p, Some(&self.root)).ok())
                    .collect();
                snapshot
                    .entries
                    .iter()
                    .filter(|(path, _)| wanted.contains(path))
                    .map(|(path, digest)| (path.clone(), digest.clone()))
                    .collect()
            }
            None => snapshot
                .entries
                .iter()
                .map(|(path, digest)| (path.clone(), digest.clone()))
                .collect(),
        };

        let paths: Vec<PathBuf> = selected.iter().map(|(path, _)| path.clone()).collect();
        let current = self
            .executor
            .run_all(paths, |path| async move { content_digest(&path).await })
            .await;

        let mut result = ModifiedFiles::default();
        for ((path, before), after) in selected.into_iter().zip(current) {
            match after {
                Ok(Ok(None)) => {
                    debug!(file = %path.display(), "file deleted since snapshot, skipping")
                }
                Ok(Ok(Some(after))) => {
                    if before.as_deref() != Some(after.as_str()) {
                        result.modified.push(path);
                    }
                }
                Ok(Err(reason)) => {
                    result.errors.insert(path, reason);
                }
                Err(e) => {
                    result.errors.insert(path, e.to_string());
                }
            }
        }

        result.modified.sort();
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::StagingConfig;
    use super::*;
    use crate::fakes::ScriptedRunner;

    fn repo_at(dir: &Path) -> Repository {
        Repository::open(dir, Arc::new(ScriptedRunner::new()), StagingConfig::default())
    }

    #[tokio::test]
    async fn test_detects_only_changed_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ts"), "let a=1").unwrap();
        std::fs::write(dir.path().join("b.ts"), "let b = 2;").unwrap();
        let repo = repo_at(dir.path());

        let snapshot = repo.capture_file_states(&["a.ts", "b.ts"]).await;
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.errors.is_empty());

        std::fs::write(dir.path().join("a.ts"), "let a = 1;\n").unwrap();

        let modified = repo.detect_modified_files(&snapshot, None).await;
        assert_eq!(modified.modified, vec![dir.path().join("a.ts")]);
        assert!(modified.errors.is_empty());
    }

    #[tokio::test]
    async fn test_rewrite_with_same_content_is_not_modified() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ts"), "same").unwrap();
        let repo = repo_at(dir.path());

        let snapshot = repo.capture_file_states(&["a.ts"]).await;
        std::fs::write(dir.path().join("a.ts"), "same").unwrap();

        let modified = repo.detect_modified_files(&snapshot, None).await;
        assert!(modified.modified.is_empty());
    }

    #[tokio::test]
    async fn test_deleted_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ts"), "x").unwrap();
        let repo = repo_at(dir.path());

        let snapshot = repo.capture_file_states(&["a.ts"]).await;
        std::fs::remove_file(dir.path().join("a.ts")).unwrap();

        let modified = repo.detect_modified_files(&snapshot, None).await;
        assert!(modified.modified.is_empty());
        assert!(modified.errors.is_empty());
    }

    #[tokio::test]
    async fn test_only_filter_limits_comparison() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ts"), "1").unwrap();
        std::fs::write(dir.path().join("b.ts"), "2").unwrap();
        let repo = repo_at(dir.path());

        let snapshot = repo.capture_file_states(&["a.ts", "b.ts"]).await;
        std::fs::write(dir.path().join("a.ts"), "10").unwrap();
        std::fs::write(dir.path().join("b.ts"), "20").unwrap();

        let only = vec![PathBuf::from("b.ts")];
        let modified = repo.detect_modified_files(&snapshot, Some(&only)).await;
        assert_eq!(modified.modified, vec![dir.path().join("b.ts")]);
    }

    #[tokio::test]
    async fn test_file_created_after_snapshot_is_modified() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo_at(dir.path());

        let snapshot = repo.capture_file_states(&["new.ts"]).await;
        assert_eq!(snapshot.entries.get(&dir.path().join("new.ts")), Some(&None));

        std::fs::write(dir.path().join("new.ts"), "created").unwrap();
        let modified = repo.detect_modified_files(&snapshot, None).await;
        assert_eq!(modified.modified, vec![dir.path().join("new.ts")]);
    }

    #[tokio::test]
    async fn test_unreadable_entries_are_collected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("folder")).unwrap();
        let repo = repo_at(dir.path());

        let snapshot = repo.capture_file_states(&["folder", ""]).await;
        assert!(snapshot.entries.is_empty());
        assert_eq!(snapshot.errors.len(), 2);
    }
}
