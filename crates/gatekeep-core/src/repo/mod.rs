//! Git repository operations.
//!
//! Everything here shells out through a [`CommandRunner`] so tests can
//! substitute a scripted runner, and every caller-supplied path is normalized
//! and placed after `--` before it reaches git.

mod edge_cases;
mod snapshot;
mod staging;
mod state;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::{args_with_paths, CommandResult, CommandRunner, RunOptions, DEFAULT_TIMEOUT_MS};
use crate::domain::error::{StagingError, ToolExecutionError};
use crate::executor::BoundedExecutor;
use crate::path::{normalize, normalize_all};

pub use edge_cases::EdgeCaseReport;
pub use snapshot::{FileSnapshot, ModifiedFiles};
pub use staging::{StageResult, DEFAULT_MAX_STAGE_ATTEMPTS, DEFAULT_RETRY_DELAY_MS};
pub use state::RepositoryState;

/// Staging and git invocation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Total `git add` attempts when the index is locked.
    pub max_attempts: u32,

    /// Delay between lock-contention retries (milliseconds).
    pub retry_delay_ms: u64,

    /// Timeout for each git command (milliseconds).
    pub command_timeout_ms: u64,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_STAGE_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            command_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// A git work tree plus the services used to operate on it.
#[derive(Clone)]
pub struct Repository {
    root: PathBuf,
    runner: Arc<dyn CommandRunner>,
    config: StagingConfig,
    executor: BoundedExecutor,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.root)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// Open the work tree rooted at `root` (must be the top level).
    pub fn open(
        root: impl Into<PathBuf>,
        runner: Arc<dyn CommandRunner>,
        config: StagingConfig,
    ) -> Self {
        Self {
            root: root.into(),
            runner,
            config,
            executor: BoundedExecutor::default(),
        }
    }

    /// Find the top level of the work tree containing `dir`.
    pub async fn discover(
        dir: &Path,
        runner: Arc<dyn CommandRunner>,
        config: StagingConfig,
    ) -> Result<Self, ToolExecutionError> {
        let options = RunOptions::in_dir(dir, config.command_timeout_ms);
        let args = vec!["rev-parse".to_string(), "--show-toplevel".to_string()];
        let result = runner
            .run("git", &args, &options)
            .await?
            .into_completed("git", config.command_timeout_ms)?;
        if !result.success || result.stdout.is_empty() {
            return Err(ToolExecutionError::MalformedOutput {
                tool: "git rev-parse".to_string(),
                reason: format!(
                    "{} is not inside a git work tree: {}",
                    dir.display(),
                    result.error_text()
                ),
            });
        }
        Ok(Self::open(PathBuf::from(result.stdout), runner, config))
    }

    /// Use `executor` for batched file reads.
    pub fn with_executor(mut self, executor: BoundedExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run git in the work tree. Timeouts become errors.
    async fn git(&self, args: &[String]) -> Result<CommandResult, ToolExecutionError> {
        let options = RunOptions::in_dir(&self.root, self.config.command_timeout_ms);
        self.runner
            .run("git", args, &options)
            .await?
            .into_completed("git", self.config.command_timeout_ms)
    }

    /// Whether the root is inside a git work tree.
    pub async fn is_repository(&self) -> bool {
        matches!(
            self.git(&strings(&["rev-parse", "--is-inside-work-tree"])).await,
            Ok(result) if result.success && result.stdout == "true"
        )
    }

    /// Whether `file` has both staged and unstaged changes.
    pub async fn has_partial_staging(&self, file: &Path) -> Result<bool, StagingError> {
        let path = normalize(file, Some(&self.root))?;
        let partial = self.partially_staged_files(&[&path]).await?;
        Ok(partial.contains(&path))
    }

    /// Those of `files` that have both staged and unstaged changes.
    ///
    /// Two git calls regardless of how many files are asked about; the
    /// second is skipped when nothing is staged.
    pub async fn partially_staged_files<P: AsRef<Path>>(
        &self,
        files: &[P],
    ) -> Result<BTreeSet<PathBuf>, StagingError> {
        if files.is_empty() {
            return Ok(BTreeSet::new());
        }
        let paths = normalize_all(files, Some(&self.root))?;

        let staged = self
            .name_list(&args_with_paths(&["diff", "--cached", "--name-only", "-z"], &paths))
            .await?;
        if staged.is_empty() {
            return Ok(BTreeSet::new());
        }
        let unstaged = self
            .name_list(&args_with_paths(&["diff", "--name-only", "-z"], &paths))
            .await?;

        let partial: BTreeSet<PathBuf> = staged.intersection(&unstaged).cloned().collect();
        debug!(checked = paths.len(), partial = partial.len(), "partial staging checked");
        Ok(partial)
    }

    /// Files added, copied, modified or renamed in the index.
    pub async fn staged_files(&self) -> Result<Vec<PathBuf>, StagingError> {
        let names = self
            .name_list(&strings(&[
                "diff",
                "--cached",
                "--name-only",
                "-z",
                "--diff-filter=ACMR",
            ]))
            .await?;
        Ok(names.into_iter().collect())
    }

    /// Run a `-z` name listing and resolve the names against the root.
    async fn name_list(&self, args: &[String]) -> Result<BTreeSet<PathBuf>, StagingError> {
        let result = self.git(args).await?;
        if !result.success {
            return Err(StagingError::Git {
                message: result.error_text().to_string(),
            });
        }
        Ok(result
            .stdout
            .split('\0')
            .filter(|name| !name.is_empty())
            .map(|name| self.root.join(name))
            .collect())
    }
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}
