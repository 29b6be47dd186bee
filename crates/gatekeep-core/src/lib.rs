//! Gatekeep Core Library
//!
//! Decision engine, safe command execution and atomic staging for the
//! gatekeep quality gate. Analyzers and fixers plug in through the
//! [`Analyzer`] and [`Fixer`] traits.

pub mod classify;
pub mod collaborator;
pub mod command;
pub mod context;
pub mod domain;
pub mod executor;
pub mod fakes;
pub mod obs;
pub mod orchestrator;
pub mod path;
pub mod repo;
pub mod telemetry;

pub use classify::{classify, Classifier, ClassifierConfig};

pub use collaborator::{Analyzer, CheckReport, FixReport, Fixer};

pub use command::{CommandResult, CommandRunner, ProcessRunner, RunOptions};

pub use context::{GateContext, Invocation};

pub use domain::{
    Action, Decision, Engine, Finding, GateError, PathValidationError, Result, Severity,
    StagingError, ToolExecutionError,
};

pub use executor::{BoundedExecutor, ExecutorConfig, ExecutorError};

pub use orchestrator::{
    FailureDetail, FixOrchestrator, OrchestrateOptions, OrchestrationReport, OrchestratorState,
    Outcome, PartialStagingPolicy,
};

pub use repo::{
    EdgeCaseReport, FileSnapshot, ModifiedFiles, Repository, RepositoryState, StageResult,
    StagingConfig,
};

/// Crate version, embedded in reports and `--version` output.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
