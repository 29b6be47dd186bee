//! Analyzer findings.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Which kind of analyzer produced a finding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    Format,
    Lint,
    Typecheck,
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Format => write!(f, "format"),
            Engine::Lint => write!(f, "lint"),
            Engine::Typecheck => write!(f, "typecheck"),
        }
    }
}

/// Severity level for a finding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single issue reported by an analyzer.
///
/// Field order matters: the derived `Ord` sorts by location first, which is
/// what the classifier uses to canonicalise its partitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Finding {
    /// File the finding points at.
    pub file: PathBuf,

    /// Line number (1-indexed).
    pub line: u32,

    /// Column number (1-indexed).
    #[serde(alias = "column")]
    pub col: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none", alias = "end_column")]
    pub end_col: Option<u32>,

    pub engine: Engine,

    pub severity: Severity,

    /// Rule/lint identifier (e.g. "no-unused-vars", "TS2322").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,

    /// Human-readable message.
    pub message: String,

    /// Replacement text or fix hint offered by the analyzer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Finding {
    /// Create a finding at `file:line:col`.
    pub fn new(
        engine: Engine,
        severity: Severity,
        file: impl Into<PathBuf>,
        line: u32,
        col: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line,
            col,
            end_line: None,
            end_col: None,
            engine,
            severity,
            rule_id: None,
            message: message.into(),
            suggestion: None,
        }
    }

    /// Set the rule identifier.
    pub fn with_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    /// Set the end of the reported span.
    pub fn with_end(mut self, end_line: u32, end_col: u32) -> Self {
        self.end_line = Some(end_line);
        self.end_col = Some(end_col);
        self
    }

    /// Attach a suggested fix.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Whether this finding points at `path`.
    pub fn is_for(&self, path: &Path) -> bool {
        self.file == path
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} [{}",
            self.file.display(),
            self.line,
            self.col,
            self.severity,
            self.engine
        )?;
        if let Some(rule) = &self.rule_id {
            write!(f, "/{rule}")?;
        }
        write!(f, "] {}", self.message)
    }
}
