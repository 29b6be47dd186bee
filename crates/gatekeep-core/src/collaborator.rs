//! Analyzer and fixer interfaces.
//!
//! The gate treats both as black boxes; it only understands the
//! [`Finding`] schema they return.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::error::ToolExecutionError;
use crate::domain::finding::Finding;

/// Result of an analyzer run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    /// True when the analyzers found nothing.
    pub success: bool,
    pub findings: Vec<Finding>,
}

impl CheckReport {
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        Self {
            success: findings.is_empty(),
            findings,
        }
    }

    /// Findings for one file.
    pub fn findings_for<'a>(&'a self, file: &'a Path) -> impl Iterator<Item = &'a Finding> + 'a {
        self.findings.iter().filter(move |f| f.is_for(file))
    }
}

/// Result of a fixer run on one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixReport {
    pub success: bool,

    /// Files the fixer claims it changed. Informational only.
    pub modified_files: Vec<PathBuf>,
}

/// Runs static analysis over a set of files.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn check(&self, files: &[PathBuf]) -> Result<CheckReport, ToolExecutionError>;
}

/// Attempts to fix findings in place.
#[async_trait]
pub trait Fixer: Send + Sync {
    /// Fix `file` given the check that found problems in it.
    async fn fix(
        &self,
        file: &Path,
        previous: &CheckReport,
    ) -> Result<FixReport, ToolExecutionError>;
}
