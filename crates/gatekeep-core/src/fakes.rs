//! Scripted fakes for the gate's collaborator traits (testing only)
//!
//! Provides `ScriptedRunner`, `StaticAnalyzer` and `ScriptedFixer` that
//! satisfy the trait contracts without spawning processes or running real
//! tools.

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::collaborator::{Analyzer, CheckReport, FixReport, Fixer};
use crate::command::{CommandResult, CommandRunner, RunOptions};
use crate::domain::error::ToolExecutionError;

// ---------------------------------------------------------------------------
// ScriptedRunner
// ---------------------------------------------------------------------------

/// One recorded `CommandRunner::run` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
    pub options: RunOptions,
}

/// Command runner that replays queued results in order.
///
/// Once the queue is drained every call succeeds with empty output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: Mutex<VecDeque<Result<CommandResult, ToolExecutionError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next call.
    pub fn push(&self, result: CommandResult) {
        self.responses.lock().unwrap().push_back(Ok(result));
    }

    /// Queue an error for the next call.
    pub fn push_error(&self, error: ToolExecutionError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        options: &RunOptions,
    ) -> Result<CommandResult, ToolExecutionError> {
        self.calls.lock().unwrap().push(RecordedCall {
            program: program.to_string(),
            args: args.to_vec(),
            options: options.clone(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(CommandResult::ok("")))
    }
}

// ---------------------------------------------------------------------------
// StaticAnalyzer
// ---------------------------------------------------------------------------

/// Analyzer returning scripted reports in sequence.
///
/// After the script runs out it keeps returning the last report, or an empty
/// passing report if nothing was scripted.
#[derive(Debug, Default)]
pub struct StaticAnalyzer {
    script: Mutex<VecDeque<Result<CheckReport, ToolExecutionError>>>,
    last: Mutex<Option<CheckReport>>,
    requests: Mutex<Vec<Vec<PathBuf>>>,
}

impl StaticAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyzer whose successive checks return `reports`.
    pub fn with_reports(reports: impl IntoIterator<Item = CheckReport>) -> Self {
        let analyzer = Self::new();
        for report in reports {
            analyzer.push(report);
        }
        analyzer
    }

    pub fn push(&self, report: CheckReport) {
        self.script.lock().unwrap().push_back(Ok(report));
    }

    pub fn push_error(&self, error: ToolExecutionError) {
        self.script.lock().unwrap().push_back(Err(error));
    }

    /// File lists passed to each `check` call.
    pub fn requests(&self) -> Vec<Vec<PathBuf>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Analyzer for StaticAnalyzer {
    async fn check(&self, files: &[PathBuf]) -> Result<CheckReport, ToolExecutionError> {
        self.requests.lock().unwrap().push(files.to_vec());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(report)) => {
                *self.last.lock().unwrap() = Some(report.clone());
                Ok(report)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| CheckReport::from_findings(vec![]))),
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptedFixer
// ---------------------------------------------------------------------------

/// Fixer that overwrites files with scripted content.
///
/// Files without scripted content are left untouched, which models a fixer
/// that ran but changed nothing.
#[derive(Debug, Default)]
pub struct ScriptedFixer {
    rewrites: Mutex<BTreeMap<PathBuf, String>>,
    failure: Mutex<Option<ToolExecutionError>>,
    fixed: Mutex<Vec<PathBuf>>,
}

impl ScriptedFixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `content` to `file` when asked to fix it.
    pub fn rewrite(self, file: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.rewrites
            .lock()
            .unwrap()
            .insert(file.into(), content.into());
        self
    }

    /// Fail every fix call with `error`.
    pub fn failing(self, error: ToolExecutionError) -> Self {
        *self.failure.lock().unwrap() = Some(error);
        self
    }

    /// Files the fixer was asked to fix, in call order.
    pub fn fixed_files(&self) -> Vec<PathBuf> {
        self.fixed.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.fixed.lock().unwrap().len()
    }
}

#[async_trait]
impl Fixer for ScriptedFixer {
    async fn fix(
        &self,
        file: &Path,
        _previous: &CheckReport,
    ) -> Result<FixReport, ToolExecutionError> {
        self.fixed.lock().unwrap().push(file.to_path_buf());

        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }

        let content = self.rewrites.lock().unwrap().get(file).cloned();
        match content {
            Some(content) => {
                tokio::fs::write(file, content)
                    .await
                    .map_err(|e| ToolExecutionError::Io {
                        program: "scripted-fixer".to_string(),
                        reason: e.to_string(),
                    })?;
                Ok(FixReport {
                    success: true,
                    modified_files: vec![file.to_path_buf()],
                })
            }
            None => Ok(FixReport {
                success: true,
                modified_files: vec![],
            }),
        }
    }
}
