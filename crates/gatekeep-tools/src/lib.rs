//! Gatekeep Tools - command-backed analyzers and fixers
//!
//! Runs formatters, linters and type checkers as external commands and turns
//! their output into gatekeep findings:
//! - `ToolSpec` describes one tool (builtin or custom)
//! - `CommandAnalyzer` implements the core `Analyzer` trait
//! - `CommandFixer` implements the core `Fixer` trait

pub mod analyzer;
pub mod fixer;
pub mod parse;
pub mod tool;

// Re-export key types
pub use analyzer::{is_covered, CommandAnalyzer};
pub use fixer::CommandFixer;
pub use parse::parse_output;
pub use tool::{default_tools, BuiltinTool, OutputFormat, ToolSpec};
