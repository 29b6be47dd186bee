//! Structured observability hooks for gate runs.
//!
//! This module provides:
//! - A run-scoped tracing span via `gate_span` or the `GateSpan` RAII guard
//! - Emission functions for lifecycle events: start, decision, staging, finish
//!
//! Events are emitted at `info!` level (filter with `RUST_LOG`).

use tracing::info;

use crate::context::GateContext;
use crate::domain::decision::Decision;

/// RAII guard that enters a span tagged with the run's correlation id.
///
/// ```ignore
/// let _span = GateSpan::enter(&ctx);
/// // every event below carries correlation_id=...
/// ```
pub struct GateSpan {
    _span: tracing::span::EnteredSpan,
}

impl GateSpan {
    pub fn enter(ctx: &GateContext) -> Self {
        Self {
            _span: gate_span(ctx).entered(),
        }
    }
}

/// Span for one gate run; attach to async work with `Instrument`.
pub fn gate_span(ctx: &GateContext) -> tracing::Span {
    tracing::info_span!(
        "gatekeep.run",
        correlation_id = %ctx.correlation_id,
        invocation = %ctx.invocation,
    )
}

/// Emit event: gate started on `files` readable files.
pub fn emit_gate_started(ctx: &GateContext, files: usize, skipped: usize) {
    info!(
        event = "gate.started",
        correlation_id = %ctx.correlation_id,
        files = files,
        skipped = skipped,
    );
}

/// Emit event: classifier produced a decision.
pub fn emit_gate_decided(ctx: &GateContext, decision: &Decision) {
    info!(
        event = "gate.decided",
        correlation_id = %ctx.correlation_id,
        action = %decision.action,
        confidence = decision.confidence,
        findings = decision.total_findings(),
        fixable = decision.fixable_findings.len(),
        unfixable = decision.unfixable_findings.len(),
    );
}

/// Emit event: files staged after a fix pass.
pub fn emit_gate_staged(ctx: &GateContext, staged: usize, attempts: u32) {
    info!(
        event = "gate.staged",
        correlation_id = %ctx.correlation_id,
        staged = staged,
        attempts = attempts,
    );
}

/// Emit event: gate finished.
pub fn emit_gate_finished(ctx: &GateContext, outcome: &str, findings: usize, duration_ms: u64) {
    info!(
        event = "gate.finished",
        correlation_id = %ctx.correlation_id,
        outcome = %outcome,
        findings = findings,
        duration_ms = duration_ms,
    );
}

/// Emit event: the gate could not complete (warning level).
pub fn emit_gate_failed(ctx: &GateContext, category: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(
        event = "gate.failed",
        correlation_id = %ctx.correlation_id,
        category = %category,
        error = %error,
    );
}
