//! Domain models for gatekeep.
//!
//! - `Finding`: one issue reported by an analyzer
//! - `Decision`: the classifier's verdict on a set of findings
//! - error taxonomy shared by every layer

pub mod decision;
pub mod error;
pub mod finding;

pub use decision::{Action, Decision};
pub use error::{GateError, PathValidationError, Result, StagingError, ToolExecutionError};
pub use finding::{Engine, Finding, Severity};
