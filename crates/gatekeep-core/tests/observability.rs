//! Observability tests for gate run lifecycle tracing.

use std::path::PathBuf;
use std::sync::Arc;

use gatekeep_core::collaborator::CheckReport;
use gatekeep_core::fakes::{ScriptedFixer, ScriptedRunner, StaticAnalyzer};
use gatekeep_core::obs::{emit_gate_finished, emit_gate_started, GateSpan};
use gatekeep_core::{
    Engine, Finding, FixOrchestrator, GateContext, Invocation, OrchestrateOptions, Repository,
    Severity, StagingConfig,
};
use tracing_test::traced_test;

#[traced_test]
#[test]
fn test_gate_span_carries_correlation_id() {
    let ctx = GateContext::new(Invocation::PreCommit);
    let span = GateSpan::enter(&ctx);
    emit_gate_started(&ctx, 2, 1);
    drop(span);

    assert!(logs_contain("gate.started"));
    assert!(logs_contain(&ctx.correlation_id.to_string()));
}

#[traced_test]
#[test]
fn test_emit_gate_finished_logs_outcome() {
    let ctx = GateContext::new(Invocation::Cli);
    emit_gate_finished(&ctx, "blocked", 3, 120);
    assert!(logs_contain("gate.finished"));
    assert!(logs_contain("blocked"));
}

#[traced_test]
#[tokio::test]
async fn test_orchestrate_emits_lifecycle_events() {
    let dir = tempfile::tempdir().unwrap();
    let file: PathBuf = dir.path().join("main.rs");
    std::fs::write(&file, "fn main() {}\n").unwrap();

    let analyzer = Arc::new(StaticAnalyzer::with_reports([CheckReport::from_findings(
        vec![Finding::new(Engine::Lint, Severity::Warning, &file, 1, 1, "unused")],
    )]));
    let repo = Repository::open(
        dir.path(),
        Arc::new(ScriptedRunner::new()),
        StagingConfig::default(),
    );
    let orchestrator = FixOrchestrator::new(repo, analyzer, Arc::new(ScriptedFixer::new()));

    let ctx = GateContext::new(Invocation::AgentHook);
    let report = orchestrator
        .orchestrate(&ctx, &[file], OrchestrateOptions::default())
        .await;

    assert!(report.passed());
    assert!(logs_contain("gate.started"));
    assert!(logs_contain("gate.decided"));
    assert!(logs_contain("gate.finished"));
}
