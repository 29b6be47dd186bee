//! Staging with bounded lock-contention retry.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::Repository;
use crate::command::args_with_paths;
use crate::domain::error::StagingError;
use crate::path::normalize_all;

/// Total `git add` attempts before lock contention is surfaced.
pub const DEFAULT_MAX_STAGE_ATTEMPTS: u32 = 3;

/// Delay between lock-contention retries.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 100;

/// Outcome of a staging call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResult {
    pub success: bool,

    /// Absolute paths that were added to the index.
    pub staged_files: BTreeSet<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Number of `git add` invocations made (0 when nothing was staged).
    pub attempts: u32,
}

impl StageResult {
    /// Nothing to stage.
    pub fn empty() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    /// Failed staging, for reporting.
    pub fn from_error(err: &StagingError) -> Self {
        let attempts = match err {
            StagingError::LockContention { attempts, .. } => *attempts,
            _ => 1,
        };
        Self {
            success: false,
            staged_files: BTreeSet::new(),
            error: Some(err.to_string()),
            attempts,
        }
    }
}

/// How a failed `git add` should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StagingFailure {
    LockContention,
    PermissionDenied,
    PathspecMismatch,
    Other,
}

/// Classify git's error text.
///
/// Permission errors win over lock errors: git reports an unwritable `.git`
/// as a failure to create `index.lock`, which no retry will fix.
pub(crate) fn classify_failure(message: &str) -> StagingFailure {
    let text = message.to_lowercase();
    if text.contains("permission denied") || text.contains("eacces") {
        StagingFailure::PermissionDenied
    } else if text.contains("index.lock")
        || text.contains("another git process")
        || (text.contains("unable to create") && text.contains(".lock"))
    {
        StagingFailure::LockContention
    } else if text.contains("pathspec")
        || text.contains("did not match any files")
        || text.contains("no such file or directory")
    {
        StagingFailure::PathspecMismatch
    } else {
        StagingFailure::Other
    }
}

impl Repository {
    /// Stage exactly `files`.
    ///
    /// An empty list succeeds without running git. Lock contention is
    /// retried up to [`StagingConfig::max_attempts`](super::StagingConfig)
    /// total attempts; every other failure is returned immediately.
    pub async fn stage<P: AsRef<Path>>(&self, files: &[P]) -> Result<StageResult, StagingError> {
        if files.is_empty() {
            return Ok(StageResult::empty());
        }

        let paths = normalize_all(files, Some(&self.root))?;
        let args = args_with_paths(&["add"], &paths);
        let max_attempts = self.config.max_attempts.max(1);
        let delay = Duration::from_millis(self.config.retry_delay_ms);

        for attempt in 1..=max_attempts {
            let result = self.git(&args).await?;

            if result.success {
                info!(files = paths.len(), attempt, "staged files");
                return Ok(StageResult {
                    success: true,
                    staged_files: paths.into_iter().collect(),
                    error: None,
                    attempts: attempt,
                });
            }

            let message = result.error_text().to_string();
            match classify_failure(&message) {
                StagingFailure::LockContention if attempt < max_attempts => {
                    warn!(attempt, max_attempts, "git index locked, retrying");
                    tokio::time::sleep(delay).await;
                }
                StagingFailure::LockContention => {
                    return Err(StagingError::LockContention {
                        attempts: attempt,
                        message,
                    });
                }
                StagingFailure::PermissionDenied => {
                    return Err(StagingError::PermissionDenied { message });
                }
                StagingFailure::PathspecMismatch => {
                    return Err(StagingError::PathspecMismatch { message });
                }
                StagingFailure::Other => return Err(StagingError::Git { message }),
            }
        }

        // Unreachable: the final attempt always returns.
        Err(StagingError::LockContention {
            attempts: max_attempts,
            message: "exhausted all attempts".into(),
        })
    }
}
