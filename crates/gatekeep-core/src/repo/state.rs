//! Point-in-time repository state (rebase / merge / conflicts).

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{strings, Repository};

/// Unmerged status codes from `git status --porcelain`.
const CONFLICT_CODES: [&str; 7] = ["DD", "AU", "UD", "UA", "DU", "AA", "UU"];

/// Snapshot of in-progress git operations. Recomputed on every call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryState {
    pub in_rebase: bool,
    pub has_conflicts: bool,
    pub is_merging: bool,
}

impl RepositoryState {
    /// No rebase, merge or conflict in progress.
    pub fn is_clean(&self) -> bool {
        !self.in_rebase && !self.has_conflicts && !self.is_merging
    }

    /// Human-readable reason the state is not clean.
    pub fn describe(&self) -> Option<String> {
        let mut parts = Vec::new();
        if self.in_rebase {
            parts.push("a rebase is in progress");
        }
        if self.is_merging {
            parts.push("a merge is in progress");
        }
        if self.has_conflicts {
            parts.push("there are unresolved conflicts");
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// Whether porcelain status output lists an unmerged path.
pub(crate) fn porcelain_has_conflicts(status: &str) -> bool {
    status
        .lines()
        .filter_map(|line| line.get(..2))
        .any(|code| CONFLICT_CODES.contains(&code))
}

async fn exists(path: &Path) -> bool {
    tokio::fs::metadata(path).await.is_ok()
}

impl Repository {
    /// Detect rebase, merge and conflict state.
    ///
    /// Outside a repository, or when git cannot be run, this returns the
    /// all-false state instead of failing.
    pub async fn repository_state(&self) -> RepositoryState {
        let git_dir = match self.git(&strings(&["rev-parse", "--git-dir"])).await {
            Ok(result) if result.success && !result.stdout.is_empty() => {
                self.root.join(result.stdout.trim())
            }
            Ok(result) => {
                debug!(stderr = %result.stderr, "not a git repository");
                return RepositoryState::default();
            }
            Err(e) => {
                debug!(error = %e, "git unavailable, assuming clean state");
                return RepositoryState::default();
            }
        };

        let in_rebase = exists(&git_dir.join("rebase-merge")).await
            || exists(&git_dir.join("rebase-apply")).await;
        let is_merging = exists(&git_dir.join("MERGE_HEAD")).await;

        let has_conflicts = match self.git(&strings(&["status", "--porcelain"])).await {
            Ok(result) if result.success => porcelain_has_conflicts(&result.stdout),
            _ => false,
        };

        let state = RepositoryState {
            in_rebase,
            has_conflicts,
            is_merging,
        };
        debug!(?state, "repository state");
        state
    }
}
