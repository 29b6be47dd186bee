//! Report rendering and exit codes.

use std::fmt::Write as _;

use anyhow::Result;
use gatekeep_core::{OrchestrationReport, Outcome};

/// Which entry point produced the report; each maps outcomes to its own
/// exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facade {
    Check,
    PreCommit,
    AgentHook,
}

/// Exit code for `outcome`.
///
/// | facade     | success | blocked | failed |
/// |------------|---------|---------|--------|
/// | check      | 0       | 1       | 3      |
/// | pre-commit | 0       | 1       | 1      |
/// | agent-hook | 0       | 2       | 1      |
///
/// Exit 2 makes agent hooks feed stderr back to the agent; exit 1 is
/// reported to the user without blocking the agent.
pub fn exit_code(facade: Facade, outcome: Outcome) -> u8 {
    match (facade, outcome) {
        (_, Outcome::Success) => 0,
        (Facade::AgentHook, Outcome::Blocked) => 2,
        (_, Outcome::Blocked) => 1,
        (Facade::Check, Outcome::Failed) => 3,
        (_, Outcome::Failed) => 1,
    }
}

pub fn render_json(report: &OrchestrationReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn render_text(report: &OrchestrationReport) -> String {
    let mut out = String::new();
    let id = report.correlation_id.simple().to_string();
    let status = match report.outcome {
        Outcome::Success => "✓ passed",
        Outcome::Blocked => "✗ blocked",
        Outcome::Failed => "✗ failed",
    };

    let _ = write!(out, "gatekeep: {status}");
    if let Some(action) = report.action {
        let _ = write!(out, " ({action})");
    }
    let _ = writeln!(out, " [run {}]", &id[..8]);

    if let Some(failure) = &report.failure {
        let _ = writeln!(out, "  {}: {}", failure.category, failure.message);
    }

    if !report.findings.is_empty() {
        let _ = writeln!(out, "Findings:");
        for finding in &report.findings {
            let _ = writeln!(out, "  {finding}");
            if let Some(suggestion) = finding.suggestion.as_deref().filter(|s| !s.is_empty()) {
                let _ = writeln!(out, "      suggestion: {suggestion}");
            }
        }
    }

    if !report.staged_files.is_empty() {
        let _ = writeln!(out, "Fixed and staged:");
        for file in &report.staged_files {
            let _ = writeln!(out, "  {}", file.display());
        }
    }

    if !report.skipped.is_empty() {
        let _ = writeln!(out, "Skipped:");
        for (file, reason) in &report.skipped {
            let _ = writeln!(out, "  {} ({reason})", file.display());
        }
    }

    for note in &report.notes {
        let _ = writeln!(out, "note: {note}");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatekeep_core::fakes::{ScriptedFixer, ScriptedRunner, StaticAnalyzer};
    use gatekeep_core::{
        CheckReport, Engine, Finding, FixOrchestrator, GateContext, Invocation,
        OrchestrateOptions, Repository, Severity, StagingConfig,
    };
    use std::sync::Arc;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(Facade::PreCommit, Outcome::Success), 0);
        assert_eq!(exit_code(Facade::PreCommit, Outcome::Blocked), 1);
        assert_eq!(exit_code(Facade::PreCommit, Outcome::Failed), 1);
        assert_eq!(exit_code(Facade::AgentHook, Outcome::Blocked), 2);
        assert_eq!(exit_code(Facade::AgentHook, Outcome::Failed), 1);
        assert_eq!(exit_code(Facade::Check, Outcome::Blocked), 1);
        assert_eq!(exit_code(Facade::Check, Outcome::Failed), 3);
    }

    async fn blocked_report() -> OrchestrationReport {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("lib.rs");
        std::fs::write(&file, "fn main() {}").unwrap();
        let analyzer = Arc::new(StaticAnalyzer::with_reports([CheckReport::from_findings(
            vec![
                Finding::new(Engine::Typecheck, Severity::Error, &file, 2, 4, "mismatched types")
                    .with_rule("E0308"),
            ],
        )]));
        let repo = Repository::open(
            dir.path(),
            Arc::new(ScriptedRunner::new()),
            StagingConfig::default(),
        );
        FixOrchestrator::new(repo, analyzer, Arc::new(ScriptedFixer::new()))
            .orchestrate(
                &GateContext::new(Invocation::Cli),
                &[file, dir.path().join("gone.rs")],
                OrchestrateOptions::default(),
            )
            .await
    }

    #[tokio::test]
    async fn test_render_text_lists_findings_and_skips() {
        let report = blocked_report().await;
        let text = render_text(&report);

        assert!(text.starts_with("gatekeep: ✗ blocked (REPORT_ONLY)"));
        assert!(text.contains("[typecheck/E0308] mismatched types"));
        assert!(text.contains("gone.rs (file does not exist)"));
    }

    #[tokio::test]
    async fn test_render_json_is_machine_readable() {
        let report = blocked_report().await;
        let json: serde_json::Value = serde_json::from_str(&render_json(&report).unwrap()).unwrap();

        assert_eq!(json["outcome"], "blocked");
        assert_eq!(json["action"], "REPORT_ONLY");
        assert_eq!(json["findings"][0]["rule_id"], "E0308");
        assert_eq!(json["correlation_id"], report.correlation_id.to_string());
    }
}
