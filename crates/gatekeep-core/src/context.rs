//! Per-invocation context.
//!
//! Carries the correlation id that tags every log event of one gate run.
//! It is created by the caller and passed down explicitly, so concurrent
//! runs never share state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where the gate was invoked from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Invocation {
    Cli,
    PreCommit,
    AgentHook,
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Invocation::Cli => write!(f, "cli"),
            Invocation::PreCommit => write!(f, "pre_commit"),
            Invocation::AgentHook => write!(f, "agent_hook"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateContext {
    pub correlation_id: Uuid,
    pub invocation: Invocation,
    pub started_at: DateTime<Utc>,
}

impl GateContext {
    pub fn new(invocation: Invocation) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            invocation,
            started_at: Utc::now(),
        }
    }

    /// Short form of the correlation id for human output.
    pub fn short_id(&self) -> String {
        self.correlation_id.simple().to_string()[..8].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contexts_are_independent() {
        let a = GateContext::new(Invocation::PreCommit);
        let b = GateContext::new(Invocation::PreCommit);
        assert_ne!(a.correlation_id, b.correlation_id);
        assert_eq!(a.short_id().len(), 8);
        assert_eq!(a.invocation.to_string(), "pre_commit");
    }
}
