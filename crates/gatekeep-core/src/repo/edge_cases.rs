//! Filtering of paths that cannot be checked or staged.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Repository;
use crate::path::normalize;

/// Readable files plus the ones skipped and why.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeCaseReport {
    /// Absolute paths that can be read, in input order, without duplicates.
    pub readable: Vec<PathBuf>,

    pub skipped: Vec<PathBuf>,

    /// Reason per skipped path.
    pub reasons: BTreeMap<PathBuf, String>,
}

impl EdgeCaseReport {
    fn skip(&mut self, path: PathBuf, reason: String) {
        debug!(file = %path.display(), %reason, "skipping file");
        if !self.reasons.contains_key(&path) {
            self.skipped.push(path.clone());
        }
        self.reasons.insert(path, reason);
    }
}

/// `Ok(())` when `path` is a regular file we can open for reading.
async fn check_readable(path: &Path) -> Result<(), String> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err("file does not exist".to_string())
        }
        Err(e) => return Err(format!("cannot stat file: {e}")),
    };
    if metadata.is_dir() {
        return Err("path is a directory".to_string());
    }
    tokio::fs::File::open(path)
        .await
        .map(|_| ())
        .map_err(|e| {
            format!("file cannot be opened for reading (locked or permission denied): {e}")
        })
}

impl Repository {
    /// Split `files` into readable files and skipped ones.
    pub async fn handle_edge_cases<P: AsRef<Path>>(&self, files: &[P]) -> EdgeCaseReport {
        let mut report = EdgeCaseReport::default();
        let mut candidates = Vec::new();

        for file in files {
            match normalize(file, Some(&self.root)) {
                Ok(path) if !candidates.contains(&path) => candidates.push(path),
                Ok(_) => {}
                Err(e) => report.skip(file.as_ref().to_path_buf(), e.to_string()),
            }
        }

        let checks = self
            .executor
            .run_all(candidates.clone(), |path| async move { check_readable(&path).await })
            .await;

        for (path, check) in candidates.into_iter().zip(checks) {
            match check {
                Ok(Ok(())) => report.readable.push(path),
                Ok(Err(reason)) => report.skip(path, reason),
                Err(e) => report.skip(path, e.to_string()),
            }
        }

        report
    }
}
