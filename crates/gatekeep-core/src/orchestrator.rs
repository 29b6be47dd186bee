//! Check → decide → fix → re-check → stage.
//!
//! [`FixOrchestrator::orchestrate`] drives one gate run as a small state
//! machine. Every step is awaited before the next one starts; the git index
//! is only touched in the final `Staging` step, and only for files whose
//! content digest actually changed during the fix pass.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::classify::Classifier;
use crate::collaborator::{Analyzer, CheckReport, Fixer};
use crate::context::GateContext;
use crate::domain::decision::{Action, Decision};
use crate::domain::error::GateError;
use crate::domain::finding::Finding;
use crate::obs;
use crate::repo::Repository;

/// States visited by one orchestration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorState {
    Checking,
    Deciding,
    Fixing,
    Rechecking,
    Staging,
    Done,
    Failed,
}

/// Final verdict of a gate run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Nothing left that should stop the commit or edit.
    Success,
    /// Findings remain that need a human (or agent) to act.
    Blocked,
    /// The gate itself could not complete.
    Failed,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::Blocked => write!(f, "blocked"),
            Outcome::Failed => write!(f, "failed"),
        }
    }
}

/// What to do with a fixed file that already had partially staged hunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialStagingPolicy {
    /// Leave it unstaged and block so the developer re-stages it.
    #[default]
    Skip,
    /// Stage the whole file anyway.
    StageAll,
    /// Fail the run.
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrateOptions {
    /// Run the fixer when the decision asks for it.
    pub attempt_fix: bool,
}

impl Default for OrchestrateOptions {
    fn default() -> Self {
        Self { attempt_fix: true }
    }
}

/// Why a run ended in [`Outcome::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub category: String,
    pub message: String,
}

impl From<&GateError> for FailureDetail {
    fn from(err: &GateError) -> Self {
        Self {
            category: err.category().to_string(),
            message: err.to_string(),
        }
    }
}

/// Everything a caller needs to render or act on a gate run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationReport {
    pub correlation_id: Uuid,
    pub outcome: Outcome,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,

    /// Findings still present when the run ended, sorted.
    pub findings: Vec<Finding>,

    pub staged_files: Vec<PathBuf>,

    /// Input paths that were not checked, with the reason.
    pub skipped: BTreeMap<PathBuf, String>,

    pub notes: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureDetail>,

    pub transitions: Vec<OrchestratorState>,
    pub finished_at: DateTime<Utc>,
}

impl OrchestrationReport {
    fn start(ctx: &GateContext) -> Self {
        Self {
            correlation_id: ctx.correlation_id,
            outcome: Outcome::Success,
            action: None,
            findings: Vec::new(),
            staged_files: Vec::new(),
            skipped: BTreeMap::new(),
            notes: Vec::new(),
            failure: None,
            transitions: Vec::new(),
            finished_at: Utc::now(),
        }
    }

    fn enter(&mut self, state: OrchestratorState) {
        debug!(?state, "orchestrator transition");
        self.transitions.push(state);
    }

    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

/// Drives analyzer, classifier, fixer and staging for one set of files.
pub struct FixOrchestrator {
    repo: Repository,
    analyzer: Arc<dyn Analyzer>,
    fixer: Arc<dyn Fixer>,
    classifier: Classifier,
    policy: PartialStagingPolicy,
}

impl FixOrchestrator {
    pub fn new(repo: Repository, analyzer: Arc<dyn Analyzer>, fixer: Arc<dyn Fixer>) -> Self {
        Self {
            repo,
            analyzer,
            fixer,
            classifier: Classifier::default(),
            policy: PartialStagingPolicy::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_partial_staging(mut self, policy: PartialStagingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run the gate over `files`.
    ///
    /// Never returns an error: tool, staging and path failures end the run in
    /// [`Outcome::Failed`] with a [`FailureDetail`].
    #[instrument(
        name = "orchestrate",
        skip_all,
        fields(correlation_id = %ctx.correlation_id, files = files.len())
    )]
    pub async fn orchestrate(
        &self,
        ctx: &GateContext,
        files: &[PathBuf],
        options: OrchestrateOptions,
    ) -> OrchestrationReport {
        let started = Instant::now();
        let mut report = OrchestrationReport::start(ctx);

        match self.run(ctx, files, options, &mut report).await {
            Ok(outcome) => {
                report.outcome = outcome;
                report.enter(OrchestratorState::Done);
            }
            Err(err) => {
                obs::emit_gate_failed(ctx, err.category(), &err);
                report.outcome = Outcome::Failed;
                report.failure = Some(FailureDetail::from(&err));
                report.enter(OrchestratorState::Failed);
            }
        }

        report.finished_at = Utc::now();
        obs::emit_gate_finished(
            ctx,
            &report.outcome.to_string(),
            report.findings.len(),
            started.elapsed().as_millis() as u64,
        );
        report
    }

    async fn run(
        &self,
        ctx: &GateContext,
        files: &[PathBuf],
        options: OrchestrateOptions,
        report: &mut OrchestrationReport,
    ) -> Result<Outcome, GateError> {
        let edge = self.repo.handle_edge_cases(files).await;
        report.skipped = edge.reasons;
        let readable = edge.readable;
        obs::emit_gate_started(ctx, readable.len(), report.skipped.len());

        if readable.is_empty() {
            report.notes.push("no readable files to check".to_string());
            return Ok(Outcome::Success);
        }

        report.enter(OrchestratorState::Checking);
        let check = self.analyzer.check(&readable).await?;

        report.enter(OrchestratorState::Deciding);
        let decision = self.classifier.classify(&check.findings);
        obs::emit_gate_decided(ctx, &decision);
        report.action = Some(decision.action);
        report.findings = sorted(&check.findings);

        if !decision.action.wants_fix() {
            return Ok(match decision.action {
                Action::Continue => Outcome::Success,
                _ => Outcome::Blocked,
            });
        }

        if !options.attempt_fix {
            report
                .notes
                .push("fixing disabled; fixable findings reported without changes".to_string());
            return Ok(Outcome::Blocked);
        }

        let state = self.repo.repository_state().await;
        if let Some(reason) = state.describe() {
            warn!(%reason, "repository busy, not fixing");
            report.notes.push(format!("no fix attempted: {reason}"));
            return Ok(Outcome::Blocked);
        }

        self.fix_and_stage(ctx, &readable, &check, &decision, report)
            .await
    }

    async fn fix_and_stage(
        &self,
        ctx: &GateContext,
        readable: &[PathBuf],
        check: &CheckReport,
        decision: &Decision,
        report: &mut OrchestrationReport,
    ) -> Result<Outcome, GateError> {
        let snapshot = self.repo.capture_file_states(readable).await;
        for (path, reason) in &snapshot.errors {
            report
                .notes
                .push(format!("could not snapshot {}: {reason}", path.display()));
        }

        // Taken before fixing: afterwards every fixed file that was staged
        // would look partially staged.
        let partially_staged = match self.policy {
            PartialStagingPolicy::StageAll => BTreeSet::new(),
            _ => self.repo.partially_staged_files(readable).await?,
        };

        report.enter(OrchestratorState::Fixing);
        for file in decision.fixable_files() {
            let fix = self.fixer.fix(&file, check).await?;
            debug!(
                file = %file.display(),
                claimed = fix.modified_files.len(),
                "fixer finished"
            );
            if !fix.success {
                report
                    .notes
                    .push(format!("fixer reported failure for {}", file.display()));
            }
        }

        report.enter(OrchestratorState::Rechecking);
        let recheck = self.analyzer.check(readable).await?;
        report.findings = sorted(&recheck.findings);

        let modified = self.repo.detect_modified_files(&snapshot, None).await;
        for (path, reason) in &modified.errors {
            report
                .notes
                .push(format!("could not re-read {}: {reason}", path.display()));
        }

        let mut to_stage = Vec::new();
        let mut held_back = Vec::new();
        for file in modified.modified {
            if partially_staged.contains(&file) {
                held_back.push(file);
            } else {
                to_stage.push(file);
            }
        }

        if !held_back.is_empty() {
            let names: Vec<String> = held_back.iter().map(|p| p.display().to_string()).collect();
            if self.policy == PartialStagingPolicy::Fail {
                return Err(GateError::PartialStaging { files: names });
            }
            for name in &names {
                report.notes.push(format!(
                    "{name} was fixed but had partially staged changes; \
                     review and stage it manually"
                ));
            }
        }

        if !to_stage.is_empty() {
            report.enter(OrchestratorState::Staging);
            let staged = self.repo.stage(&to_stage).await?;
            obs::emit_gate_staged(ctx, staged.staged_files.len(), staged.attempts);
            report.staged_files = staged.staged_files.into_iter().collect();
        }

        let outcome = if !held_back.is_empty() {
            Outcome::Blocked
        } else if recheck.findings.is_empty() {
            Outcome::Success
        } else {
            match decision.action {
                Action::FixAndReport
                    if self.classifier.classify(&recheck.findings).action == Action::Continue =>
                {
                    Outcome::Success
                }
                _ => Outcome::Blocked,
            }
        };

        info!(
            outcome = %outcome,
            staged = report.staged_files.len(),
            remaining = recheck.findings.len(),
            "fix pass complete"
        );
        Ok(outcome)
    }
}

fn sorted(findings: &[Finding]) -> Vec<Finding> {
    let mut findings = findings.to_vec();
    findings.sort();
    findings
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::command::CommandResult;
    use crate::context::Invocation;
    use crate::domain::error::ToolExecutionError;
    use crate::domain::finding::{Engine, Severity};
    use crate::fakes::{ScriptedFixer, ScriptedRunner, StaticAnalyzer};
    use crate::repo::StagingConfig;

    struct Harness {
        dir: tempfile::TempDir,
        runner: Arc<ScriptedRunner>,
        analyzer: Arc<StaticAnalyzer>,
        fixer: Arc<ScriptedFixer>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
                runner: Arc::new(ScriptedRunner::new()),
                analyzer: Arc::new(StaticAnalyzer::new()),
                fixer: Arc::new(ScriptedFixer::new()),
            }
        }

        fn file(&self, name: &str, content: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            std::fs::write(&path, content).unwrap();
            path
        }

        fn orchestrator(&self) -> FixOrchestrator {
            let config = StagingConfig {
                retry_delay_ms: 1,
                ..Default::default()
            };
            let repo = Repository::open(self.dir.path(), self.runner.clone(), config);
            FixOrchestrator::new(repo, self.analyzer.clone(), self.fixer.clone())
        }

        fn git_add_calls(&self) -> Vec<Vec<String>> {
            self.runner
                .calls()
                .into_iter()
                .filter(|c| c.args.first().map(String::as_str) == Some("add"))
                .map(|c| c.args)
                .collect()
        }
    }

    fn format_finding(file: &Path) -> Finding {
        Finding::new(Engine::Format, Severity::Warning, file, 1, 1, "not formatted")
    }

    fn type_finding(file: &Path) -> Finding {
        Finding::new(Engine::Typecheck, Severity::Error, file, 3, 5, "mismatched types")
            .with_rule("E0308")
    }

    fn ctx() -> GateContext {
        GateContext::new(Invocation::Cli)
    }

    #[tokio::test]
    async fn test_format_only_is_fixed_and_staged() {
        let mut h = Harness::new();
        let file = h.file("lib.rs", "fn  main(){}");
        h.fixer = Arc::new(ScriptedFixer::new().rewrite(&file, "fn main() {}\n"));
        h.analyzer
            .push(CheckReport::from_findings(vec![format_finding(&file)]));
        h.analyzer.push(CheckReport::from_findings(vec![]));

        let report = h
            .orchestrator()
            .orchestrate(&ctx(), &[file.clone()], OrchestrateOptions::default())
            .await;

        assert_eq!(report.outcome, Outcome::Success);
        assert_eq!(report.action, Some(Action::FixSilently));
        assert_eq!(report.staged_files, vec![file.clone()]);
        assert!(report.findings.is_empty());
        assert_eq!(h.fixer.fixed_files(), vec![file.clone()]);
        assert_eq!(
            h.git_add_calls(),
            vec![vec![
                "add".to_string(),
                "--".to_string(),
                file.display().to_string()
            ]]
        );
        assert_eq!(
            report.transitions,
            vec![
                OrchestratorState::Checking,
                OrchestratorState::Deciding,
                OrchestratorState::Fixing,
                OrchestratorState::Rechecking,
                OrchestratorState::Staging,
                OrchestratorState::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_typecheck_only_blocks_without_fixing() {
        let h = Harness::new();
        let file = h.file("lib.rs", "fn main() { let x: u8 = \"a\"; }");
        h.analyzer
            .push(CheckReport::from_findings(vec![type_finding(&file)]));

        let report = h
            .orchestrator()
            .orchestrate(&ctx(), &[file.clone()], OrchestrateOptions::default())
            .await;

        assert_eq!(report.outcome, Outcome::Blocked);
        assert_eq!(report.action, Some(Action::ReportOnly));
        assert_eq!(report.findings, vec![type_finding(&file)]);
        assert_eq!(h.fixer.call_count(), 0);
        assert_eq!(h.runner.call_count(), 0);
        assert!(report.staged_files.is_empty());
    }

    #[tokio::test]
    async fn test_mixed_findings_stage_modified_file_but_block() {
        let mut h = Harness::new();
        let file = h.file("lib.rs", "fn  main(){ let x: u8 = \"a\"; }");
        h.fixer = Arc::new(
            ScriptedFixer::new().rewrite(&file, "fn main() {\n    let x: u8 = \"a\";\n}\n"),
        );
        h.analyzer.push(CheckReport::from_findings(vec![
            format_finding(&file),
            type_finding(&file),
        ]));
        h.analyzer
            .push(CheckReport::from_findings(vec![type_finding(&file)]));

        let report = h
            .orchestrator()
            .orchestrate(&ctx(), &[file.clone()], OrchestrateOptions::default())
            .await;

        assert_eq!(report.action, Some(Action::FixAndReport));
        assert_eq!(report.outcome, Outcome::Blocked);
        assert_eq!(report.staged_files, vec![file.clone()]);
        assert_eq!(report.findings, vec![type_finding(&file)]);
    }

    #[tokio::test]
    async fn test_unchanged_files_are_never_staged() {
        let mut h = Harness::new();
        let changed = h.file("a.rs", "a");
        let untouched = h.file("b.rs", "b");
        h.fixer = Arc::new(ScriptedFixer::new().rewrite(&changed, "a\n"));
        h.analyzer.push(CheckReport::from_findings(vec![
            format_finding(&changed),
            format_finding(&untouched),
        ]));
        h.analyzer
            .push(CheckReport::from_findings(vec![format_finding(&untouched)]));

        let report = h
            .orchestrator()
            .orchestrate(
                &ctx(),
                &[changed.clone(), untouched.clone()],
                OrchestrateOptions::default(),
            )
            .await;

        assert_eq!(h.fixer.call_count(), 2);
        assert_eq!(report.staged_files, vec![changed]);
        assert_eq!(report.outcome, Outcome::Blocked);
    }

    #[tokio::test]
    async fn test_clean_check_passes() {
        let h = Harness::new();
        let file = h.file("lib.rs", "fn main() {}\n");

        let report = h
            .orchestrator()
            .orchestrate(&ctx(), &[file], OrchestrateOptions::default())
            .await;

        assert!(report.passed());
        assert_eq!(report.action, Some(Action::Continue));
        assert_eq!(h.analyzer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_no_readable_files_skips_analysis() {
        let h = Harness::new();
        let missing = h.dir.path().join("missing.rs");

        let report = h
            .orchestrator()
            .orchestrate(&ctx(), &[missing.clone()], OrchestrateOptions::default())
            .await;

        assert!(report.passed());
        assert_eq!(h.analyzer.call_count(), 0);
        assert_eq!(report.skipped[&missing], "file does not exist");
        assert_eq!(report.transitions, vec![OrchestratorState::Done]);
    }

    #[tokio::test]
    async fn test_fix_disabled_reports_only() {
        let h = Harness::new();
        let file = h.file("lib.rs", "fn  main(){}");
        h.analyzer
            .push(CheckReport::from_findings(vec![format_finding(&file)]));

        let report = h
            .orchestrator()
            .orchestrate(&ctx(), &[file], OrchestrateOptions { attempt_fix: false })
            .await;

        assert_eq!(report.outcome, Outcome::Blocked);
        assert_eq!(h.fixer.call_count(), 0);
        assert!(report.notes[0].contains("fixing disabled"));
    }

    #[tokio::test]
    async fn test_analyzer_failure_is_failed_outcome() {
        let h = Harness::new();
        let file = h.file("lib.rs", "");
        h.analyzer.push_error(ToolExecutionError::TimedOut {
            program: "cargo".to_string(),
            timeout_ms: 10,
        });

        let report = h
            .orchestrator()
            .orchestrate(&ctx(), &[file], OrchestrateOptions::default())
            .await;

        assert_eq!(report.outcome, Outcome::Failed);
        let failure = report.failure.unwrap();
        assert_eq!(failure.category, "tool_execution");
        assert!(report.findings.is_empty());
        assert_eq!(
            report.transitions.last(),
            Some(&OrchestratorState::Failed)
        );
    }

    #[tokio::test]
    async fn test_staging_failure_is_failed_outcome() {
        let mut h = Harness::new();
        let file = h.file("lib.rs", "x");
        h.fixer = Arc::new(ScriptedFixer::new().rewrite(&file, "y"));
        h.analyzer
            .push(CheckReport::from_findings(vec![format_finding(&file)]));
        h.analyzer.push(CheckReport::from_findings(vec![]));
        // rev-parse, partial staging check (nothing staged), then git add
        h.runner.push(CommandResult::ok(""));
        h.runner.push(CommandResult::ok(""));
        h.runner
            .push(CommandResult::failed(128, "error: open(\"lib.rs\"): Permission denied"));

        let report = h
            .orchestrator()
            .orchestrate(&ctx(), &[file], OrchestrateOptions::default())
            .await;

        assert_eq!(report.outcome, Outcome::Failed);
        assert_eq!(report.failure.unwrap().category, "staging");
    }

    #[tokio::test]
    async fn test_partially_staged_file_is_held_back() {
        let mut h = Harness::new();
        let file = h.file("lib.rs", "x");
        h.fixer = Arc::new(ScriptedFixer::new().rewrite(&file, "y"));
        h.analyzer
            .push(CheckReport::from_findings(vec![format_finding(&file)]));
        h.analyzer.push(CheckReport::from_findings(vec![]));
        // rev-parse --git-dir, then both diffs of the partial staging check
        h.runner.push(CommandResult::ok(""));
        h.runner.push(CommandResult::ok("lib.rs"));
        h.runner.push(CommandResult::ok("lib.rs"));

        let report = h
            .orchestrator()
            .orchestrate(&ctx(), &[file.clone()], OrchestrateOptions::default())
            .await;

        assert_eq!(report.outcome, Outcome::Blocked);
        assert!(report.staged_files.is_empty());
        assert!(h.git_add_calls().is_empty());
        assert!(report.notes.iter().any(|n| n.contains("partially staged")));
    }

    #[tokio::test]
    async fn test_partial_staging_checked_before_fixer() {
        let mut h = Harness::new();
        let file = h.file("lib.rs", "x");
        h.fixer = Arc::new(ScriptedFixer::new().rewrite(&file, "y"));
        h.analyzer
            .push(CheckReport::from_findings(vec![format_finding(&file)]));
        h.analyzer.push(CheckReport::from_findings(vec![]));
        // fully staged: listed by diff --cached, clean in the work tree
        h.runner.push(CommandResult::ok(""));
        h.runner.push(CommandResult::ok("lib.rs"));
        h.runner.push(CommandResult::ok(""));

        let report = h
            .orchestrator()
            .orchestrate(&ctx(), &[file.clone()], OrchestrateOptions::default())
            .await;

        assert_eq!(report.outcome, Outcome::Success);
        assert_eq!(report.staged_files, vec![file]);
        let calls: Vec<String> = h
            .runner
            .calls()
            .iter()
            .map(|c| c.args[..2].join(" "))
            .collect();
        assert_eq!(
            calls,
            vec!["rev-parse --git-dir", "diff --cached", "diff --name-only", "add --"]
        );
    }

    #[tokio::test]
    async fn test_stage_all_policy_skips_partial_check() {
        let mut h = Harness::new();
        let file = h.file("lib.rs", "x");
        h.fixer = Arc::new(ScriptedFixer::new().rewrite(&file, "y"));
        h.analyzer
            .push(CheckReport::from_findings(vec![format_finding(&file)]));
        h.analyzer.push(CheckReport::from_findings(vec![]));

        let report = h
            .orchestrator()
            .with_partial_staging(PartialStagingPolicy::StageAll)
            .orchestrate(&ctx(), &[file.clone()], OrchestrateOptions::default())
            .await;

        assert_eq!(report.outcome, Outcome::Success);
        assert_eq!(report.staged_files, vec![file]);
        assert_eq!(h.runner.call_count(), 2);
    }

    #[tokio::test]
    async fn test_timed_out_git_add_is_tool_failure() {
        let mut h = Harness::new();
        let file = h.file("lib.rs", "x");
        h.fixer = Arc::new(ScriptedFixer::new().rewrite(&file, "y"));
        h.analyzer
            .push(CheckReport::from_findings(vec![format_finding(&file)]));
        h.analyzer.push(CheckReport::from_findings(vec![]));
        h.runner.push(CommandResult::ok(""));
        h.runner.push(CommandResult::ok(""));
        h.runner.push(CommandResult::new(None, "", "", true));

        let report = h
            .orchestrator()
            .orchestrate(&ctx(), &[file], OrchestrateOptions::default())
            .await;

        assert_eq!(report.outcome, Outcome::Failed);
        assert_eq!(report.failure.unwrap().category, "tool_execution");
    }

    #[tokio::test]
    async fn test_partial_staging_fail_policy() {
        let mut h = Harness::new();
        let file = h.file("lib.rs", "x");
        h.fixer = Arc::new(ScriptedFixer::new().rewrite(&file, "y"));
        h.analyzer
            .push(CheckReport::from_findings(vec![format_finding(&file)]));
        h.analyzer.push(CheckReport::from_findings(vec![]));
        h.runner.push(CommandResult::ok(""));
        h.runner.push(CommandResult::ok("lib.rs"));
        h.runner.push(CommandResult::ok("lib.rs"));

        let report = h
            .orchestrator()
            .with_partial_staging(PartialStagingPolicy::Fail)
            .orchestrate(&ctx(), &[file], OrchestrateOptions::default())
            .await;

        assert_eq!(report.outcome, Outcome::Failed);
        assert_eq!(report.failure.unwrap().category, "partial_staging");
    }

    #[test]
    fn test_report_serializes_snake_case() {
        let report = OrchestrationReport::start(&ctx());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], "success");
        assert!(json.get("failure").is_none());
    }
}
