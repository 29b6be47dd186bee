//! Command-backed analyzer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use gatekeep_core::collaborator::{Analyzer, CheckReport};
use gatekeep_core::command::{args_with_paths, CommandResult, CommandRunner, RunOptions};
use gatekeep_core::{BoundedExecutor, Finding, ToolExecutionError};
use tracing::{debug, info};

use crate::parse::parse_output;
use crate::tool::{OutputFormat, ToolSpec};

/// Runs each enabled tool's check command and collects findings.
pub struct CommandAnalyzer {
    runner: Arc<dyn CommandRunner>,
    root: PathBuf,
    tools: Vec<ToolSpec>,
    executor: BoundedExecutor,
}

impl CommandAnalyzer {
    /// Analyzer running `tools` in the repository at `root`.
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        root: impl Into<PathBuf>,
        tools: Vec<ToolSpec>,
    ) -> Self {
        Self {
            runner,
            root: root.into(),
            tools,
            executor: BoundedExecutor::default(),
        }
    }

    /// Use `executor` to bound concurrent per-file checks.
    pub fn with_executor(mut self, executor: BoundedExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Run one tool over the files it applies to.
    pub async fn check_with(
        &self,
        tool: &ToolSpec,
        files: &[PathBuf],
    ) -> Result<Vec<Finding>, ToolExecutionError> {
        let targets: Vec<PathBuf> = files
            .iter()
            .filter(|file| tool.applies_to(file))
            .cloned()
            .collect();
        if targets.is_empty() {
            debug!(tool = %tool.name, "no applicable files");
            return Ok(Vec::new());
        }

        if tool.pass_files && tool.per_file {
            let results = self
                .executor
                .run_all(targets.clone(), |file| async move {
                    self.invoke(tool, std::slice::from_ref(&file)).await
                })
                .await;

            let mut findings = Vec::new();
            for result in results {
                let batch = result.map_err(|e| ToolExecutionError::Io {
                    program: tool.name.clone(),
                    reason: e.to_string(),
                })??;
                findings.extend(batch);
            }
            return Ok(findings);
        }

        self.invoke(tool, &targets).await
    }

    async fn invoke(
        &self,
        tool: &ToolSpec,
        files: &[PathBuf],
    ) -> Result<Vec<Finding>, ToolExecutionError> {
        let Some((program, base)) = tool.check_command.split_first() else {
            return Err(ToolExecutionError::Spawn {
                program: tool.name.clone(),
                reason: "empty check command".to_string(),
            });
        };

        let args = if tool.pass_files {
            args_with_paths(base, files)
        } else {
            base.to_vec()
        };
        let options = RunOptions::in_dir(&self.root, tool.timeout_ms());
        let result = self
            .runner
            .run(program, &args, &options)
            .await?
            .into_completed(program, tool.timeout_ms())?;

        let findings = parse_output(tool, &self.root, files, &result)?;
        ensure_explained(tool, &result, &findings)?;

        debug!(
            tool = %tool.name,
            files = files.len(),
            findings = findings.len(),
            duration_ms = result.duration_ms,
            "tool finished"
        );
        Ok(findings)
    }
}

/// A failing exit with nothing parsed means the tool itself broke.
fn ensure_explained(
    tool: &ToolSpec,
    result: &CommandResult,
    findings: &[Finding],
) -> Result<(), ToolExecutionError> {
    if result.success || !findings.is_empty() || tool.output == OutputFormat::ExitStatus {
        return Ok(());
    }
    // Project-wide checkers may fail only on files outside the request.
    if !tool.pass_files && !result.stdout.is_empty() {
        return Ok(());
    }
    Err(ToolExecutionError::MalformedOutput {
        tool: tool.name.clone(),
        reason: format!(
            "exited with {:?} but reported no findings: {}",
            result.exit_code,
            result.error_text()
        ),
    })
}

#[async_trait]
impl Analyzer for CommandAnalyzer {
    async fn check(&self, files: &[PathBuf]) -> Result<CheckReport, ToolExecutionError> {
        let mut findings = Vec::new();
        for tool in self.tools.iter().filter(|t| t.enabled) {
            findings.extend(self.check_with(tool, files).await?);
        }
        findings.sort();
        findings.dedup();

        info!(files = files.len(), findings = findings.len(), "analysis complete");
        Ok(CheckReport::from_findings(findings))
    }
}

/// Whether any enabled tool applies to `file`.
pub fn is_covered(tools: &[ToolSpec], file: &Path) -> bool {
    tools.iter().any(|t| t.enabled && t.applies_to(file))
}
