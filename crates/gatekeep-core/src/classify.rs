//! Finding classification.
//!
//! Turns a finding sequence into a [`Decision`]. Classification is total and
//! pure: the same multiset of findings always yields the same action and the
//! same (canonically sorted) partitions, whatever order they arrive in.
//!
//! Rules:
//! - format findings are always fixable
//! - lint findings are fixable when they carry a suggestion or their rule is
//!   listed in [`ClassifierConfig::fixable_lint_rules`]
//! - typecheck findings are never fixable
//! - a finding blocks when it is an error or comes from the type checker
//!
//! | fixable | unfixable                 | action           |
//! |---------|---------------------------|------------------|
//! | none    | none                      | `CONTINUE`       |
//! | some    | none                      | `FIX_SILENTLY`   |
//! | some    | some                      | `FIX_AND_REPORT` |
//! | none    | some, at least one blocks | `REPORT_ONLY`    |
//! | none    | some, none block          | `CONTINUE`       |

use serde::{Deserialize, Serialize};

use crate::domain::decision::{Action, Decision};
use crate::domain::finding::{Engine, Finding, Severity};

/// Confidence that a formatter resolves a format finding.
const FORMAT_FIX_CONFIDENCE: f32 = 1.0;

/// Confidence that a lint autofix resolves a lint finding.
const LINT_FIX_CONFIDENCE: f32 = 0.85;

/// Confidence when letting non-blocking warnings through.
const WARNING_PASS_CONFIDENCE: f32 = 0.8;

/// Classifier tuning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Lint rules whose autofix is trusted even without a suggestion.
    pub fixable_lint_rules: Vec<String>,
}

/// Stateless classifier; holds only its configuration.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Whether a fixer is expected to resolve `finding`.
    pub fn is_fixable(&self, finding: &Finding) -> bool {
        match finding.engine {
            Engine::Format => true,
            Engine::Lint => {
                finding.suggestion.is_some()
                    || finding
                        .rule_id
                        .as_ref()
                        .is_some_and(|rule| self.config.fixable_lint_rules.contains(rule))
            }
            Engine::Typecheck => false,
        }
    }

    /// Whether `finding` must stop the commit/edit when left unresolved.
    pub fn is_blocking(finding: &Finding) -> bool {
        finding.severity == Severity::Error || finding.engine == Engine::Typecheck
    }

    /// Classify a finding sequence.
    pub fn classify(&self, findings: &[Finding]) -> Decision {
        let (mut fixable, mut unfixable): (Vec<Finding>, Vec<Finding>) =
            findings.iter().cloned().partition(|f| self.is_fixable(f));
        fixable.sort();
        unfixable.sort();

        let total = fixable.len() + unfixable.len();
        let blocking = unfixable.iter().filter(|f| Self::is_blocking(f)).count();

        let (action, confidence) = match (fixable.is_empty(), unfixable.is_empty()) {
            (true, true) => (Action::Continue, 1.0),
            (false, true) => (Action::FixSilently, mean_fix_confidence(&fixable)),
            (false, false) => (Action::FixAndReport, fixable.len() as f32 / total as f32),
            (true, false) if blocking > 0 => (Action::ReportOnly, blocking as f32 / total as f32),
            (true, false) => {
                let has_warnings = unfixable.iter().any(|f| f.severity == Severity::Warning);
                let confidence = if has_warnings {
                    WARNING_PASS_CONFIDENCE
                } else {
                    1.0
                };
                (Action::Continue, confidence)
            }
        };

        Decision {
            action,
            confidence: confidence.clamp(0.0, 1.0),
            fixable_findings: fixable,
            unfixable_findings: unfixable,
        }
    }
}

/// Mean per-finding fix confidence; `fixable` must be sorted so the float
/// sum is order-stable.
fn mean_fix_confidence(fixable: &[Finding]) -> f32 {
    let sum: f32 = fixable
        .iter()
        .map(|f| match f.engine {
            Engine::Format => FORMAT_FIX_CONFIDENCE,
            _ => LINT_FIX_CONFIDENCE,
        })
        .sum();
    sum / fixable.len() as f32
}

/// Classify with the default configuration.
pub fn classify(findings: &[Finding]) -> Decision {
    Classifier::default().classify(findings)
}
