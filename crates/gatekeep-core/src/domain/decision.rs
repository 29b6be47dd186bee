//! Classifier verdicts.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::finding::Finding;

/// What the gate should do with a set of findings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Everything found can be fixed automatically; fix and stage quietly.
    FixSilently,
    /// Nothing blocking; let the edit/commit through.
    Continue,
    /// Blocking findings that no tool can fix; report and stop.
    ReportOnly,
    /// Fix what can be fixed, then report what remains.
    FixAndReport,
}

impl Action {
    /// Whether this action invokes the fixer.
    pub fn wants_fix(self) -> bool {
        matches!(self, Action::FixSilently | Action::FixAndReport)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::FixSilently => write!(f, "FIX_SILENTLY"),
            Action::Continue => write!(f, "CONTINUE"),
            Action::ReportOnly => write!(f, "REPORT_ONLY"),
            Action::FixAndReport => write!(f, "FIX_AND_REPORT"),
        }
    }
}

/// The classifier's verdict on a finding sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    pub action: Action,

    /// Confidence in the action, in `[0, 1]`.
    pub confidence: f32,

    /// Findings a fixer is expected to resolve, in canonical order.
    pub fixable_findings: Vec<Finding>,

    /// Findings that need a human, in canonical order.
    pub unfixable_findings: Vec<Finding>,
}

impl Decision {
    /// Total number of findings the decision covers.
    pub fn total_findings(&self) -> usize {
        self.fixable_findings.len() + self.unfixable_findings.len()
    }

    /// Distinct files that carry at least one fixable finding, sorted.
    pub fn fixable_files(&self) -> Vec<std::path::PathBuf> {
        let mut files: Vec<_> = self
            .fixable_findings
            .iter()
            .map(|f| f.file.clone())
            .collect();
        files.sort();
        files.dedup();
        files
    }
}
