//! Command-backed fixer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use gatekeep_core::collaborator::{CheckReport, FixReport, Fixer};
use gatekeep_core::command::{args_with_paths, CommandRunner, RunOptions};
use gatekeep_core::{Engine, ToolExecutionError};
use tracing::{debug, warn};

use crate::tool::ToolSpec;

/// Runs the fix command of every tool that reported on a file.
///
/// Lint fixers run before formatters so the formatter has the last word on
/// layout.
pub struct CommandFixer {
    runner: Arc<dyn CommandRunner>,
    root: PathBuf,
    tools: Vec<ToolSpec>,
}

impl CommandFixer {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        root: impl Into<PathBuf>,
        tools: Vec<ToolSpec>,
    ) -> Self {
        let mut tools: Vec<ToolSpec> = tools
            .into_iter()
            .filter(|t| t.enabled && t.fix_command.is_some())
            .collect();
        tools.sort_by_key(|t| t.engine == Engine::Format);
        Self {
            runner,
            root: root.into(),
            tools,
        }
    }

    /// Fixable tools that reported something on `file`.
    fn tools_for<'a>(
        &'a self,
        file: &'a Path,
        previous: &'a CheckReport,
    ) -> impl Iterator<Item = &'a ToolSpec> + 'a {
        self.tools.iter().filter(move |tool| {
            tool.applies_to(file) && previous.findings_for(file).any(|f| f.engine == tool.engine)
        })
    }
}

#[async_trait]
impl Fixer for CommandFixer {
    async fn fix(
        &self,
        file: &Path,
        previous: &CheckReport,
    ) -> Result<FixReport, ToolExecutionError> {
        let mut success = true;
        let mut ran = false;

        for tool in self.tools_for(file, previous) {
            let fix_command = tool.fix_command.as_deref();
            let Some((program, base)) = fix_command.and_then(<[String]>::split_first) else {
                continue;
            };
            let args = args_with_paths(base, &[file]);
            let options = RunOptions::in_dir(&self.root, tool.timeout_ms());
            let result = self
                .runner
                .run(program, &args, &options)
                .await?
                .into_completed(program, tool.timeout_ms())?;
            ran = true;

            if result.success {
                debug!(tool = %tool.name, file = %file.display(), "fix applied");
            } else {
                warn!(
                    tool = %tool.name,
                    file = %file.display(),
                    exit_code = ?result.exit_code,
                    stderr = %result.stderr,
                    "fix command failed"
                );
                success = false;
            }
        }

        Ok(FixReport {
            success,
            modified_files: if ran { vec![file.to_path_buf()] } else { vec![] },
        })
    }
}
