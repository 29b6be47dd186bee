//! Error taxonomy for the gate.
//!
//! Quality issues are never errors: they surface as a blocked outcome.
//! Everything in this module means "we could not determine or apply
//! quality", which callers report as a tooling incident.

/// A path could not be accepted onto a command line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathValidationError {
    #[error("path must not be empty")]
    Empty,

    #[error("cannot resolve relative path {path}: {reason}")]
    Unresolvable { path: String, reason: String },
}

/// An external command could not be run to completion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolExecutionError {
    #[error("failed to spawn {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("{program} timed out after {timeout_ms}ms")]
    TimedOut { program: String, timeout_ms: u64 },

    #[error("i/o error while running {program}: {reason}")]
    Io { program: String, reason: String },

    #[error("could not interpret output of {tool}: {reason}")]
    MalformedOutput { tool: String, reason: String },
}

/// Staging failed.
///
/// Only [`StagingError::LockContention`] is ever retried; it is returned once
/// the retry budget is spent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StagingError {
    #[error(
        "git index is locked by another process (gave up after {attempts} attempt(s)): {message}"
    )]
    LockContention { attempts: u32, message: String },

    #[error("permission denied while staging; check ownership of the files and of .git: {message}")]
    PermissionDenied { message: String },

    #[error("pathspec did not match; files may have been moved or deleted: {message}")]
    PathspecMismatch { message: String },

    #[error("git add failed: {message}")]
    Git { message: String },

    #[error(transparent)]
    InvalidPath(#[from] PathValidationError),

    #[error(transparent)]
    Tool(#[from] ToolExecutionError),
}

/// Errors that turn an orchestration into a `failed` outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("tool execution error: {0}")]
    Tool(#[from] ToolExecutionError),

    #[error("staging error: {0}")]
    Staging(#[from] StagingError),

    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathValidationError),

    #[error("refusing to stage partially staged file(s): {}", files.join(", "))]
    PartialStaging { files: Vec<String> },
}

impl GateError {
    /// Short machine-readable category used in reports.
    pub fn category(&self) -> &'static str {
        match self {
            GateError::Tool(_) | GateError::Staging(StagingError::Tool(_)) => "tool_execution",
            GateError::InvalidPath(_) | GateError::Staging(StagingError::InvalidPath(_)) => {
                "path_validation"
            }
            GateError::Staging(_) => "staging",
            GateError::PartialStaging { .. } => "partial_staging",
        }
    }
}

/// Result type for gate operations.
pub type Result<T> = std::result::Result<T, GateError>;
