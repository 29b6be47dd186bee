//! Tool definitions and configuration.

use std::path::Path;

use gatekeep_core::Engine;
use serde::{Deserialize, Serialize};

/// How a tool reports its findings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// JSON array of findings (or `{"findings": [...]}`) on stdout.
    Json,

    /// `file:line:col: message [Severity/rule]`, one per line.
    Unix,

    /// TypeScript compiler: `file(line,col): error TS1234: message`.
    Tsc,

    /// Only the exit status is meaningful.
    #[default]
    ExitStatus,
}

/// Builtin tools.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinTool {
    /// rustfmt --check -l
    Rustfmt,

    /// prettier --check
    Prettier,

    /// eslint --format unix
    Eslint,

    /// tsc --noEmit
    Tsc,
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

impl BuiltinTool {
    /// Get the tool name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinTool::Rustfmt => "rustfmt",
            BuiltinTool::Prettier => "prettier",
            BuiltinTool::Eslint => "eslint",
            BuiltinTool::Tsc => "tsc",
        }
    }

    pub fn engine(&self) -> Engine {
        match self {
            BuiltinTool::Rustfmt | BuiltinTool::Prettier => Engine::Format,
            BuiltinTool::Eslint => Engine::Lint,
            BuiltinTool::Tsc => Engine::Typecheck,
        }
    }

    /// Get the tool's check command.
    pub fn check_command(&self) -> Vec<String> {
        match self {
            BuiltinTool::Rustfmt => strings(&["rustfmt", "--edition", "2021", "--check", "-l"]),
            BuiltinTool::Prettier => strings(&["prettier", "--check"]),
            BuiltinTool::Eslint => strings(&["eslint", "--format", "unix"]),
            BuiltinTool::Tsc => strings(&["tsc", "--noEmit", "--pretty", "false"]),
        }
    }

    /// Get the tool's fix command (if available).
    pub fn fix_command(&self) -> Option<Vec<String>> {
        match self {
            BuiltinTool::Rustfmt => Some(strings(&["rustfmt", "--edition", "2021"])),
            BuiltinTool::Prettier => Some(strings(&["prettier", "--write"])),
            BuiltinTool::Eslint => Some(strings(&["eslint", "--fix"])),
            BuiltinTool::Tsc => None,
        }
    }

    pub fn output(&self) -> OutputFormat {
        match self {
            BuiltinTool::Rustfmt | BuiltinTool::Prettier => OutputFormat::ExitStatus,
            BuiltinTool::Eslint => OutputFormat::Unix,
            BuiltinTool::Tsc => OutputFormat::Tsc,
        }
    }

    /// File extensions the tool understands.
    pub fn extensions(&self) -> Vec<String> {
        match self {
            BuiltinTool::Rustfmt => strings(&["rs"]),
            BuiltinTool::Prettier => strings(&[
                "js", "jsx", "mjs", "cjs", "ts", "tsx", "json", "css", "scss", "md", "yaml", "yml",
            ]),
            BuiltinTool::Eslint => strings(&["js", "jsx", "mjs", "cjs", "ts", "tsx"]),
            BuiltinTool::Tsc => strings(&["ts", "tsx"]),
        }
    }

    /// Whether the check command takes the files on its command line.
    ///
    /// `tsc` checks the whole project; its findings are filtered afterwards.
    pub fn pass_files(&self) -> bool {
        !matches!(self, BuiltinTool::Tsc)
    }
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

/// Configuration for one analysis tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolSpec {
    /// Human-readable tool name.
    pub name: String,

    /// Engine assigned to findings that do not name one.
    pub engine: Engine,

    /// Check command (first element is the executable).
    pub check_command: Vec<String>,

    /// Command that fixes files in place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_command: Option<Vec<String>>,

    /// Append `--` and the files to the check command.
    #[serde(default = "default_true")]
    pub pass_files: bool,

    /// Run the check once per file instead of once per batch.
    #[serde(default)]
    pub per_file: bool,

    #[serde(default)]
    pub output: OutputFormat,

    /// Extensions (without the dot) the tool applies to; empty means all.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Timeout in seconds (0 = none).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Whether this tool is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl ToolSpec {
    /// Create a tool configuration from a builtin tool.
    pub fn from_builtin(tool: BuiltinTool, timeout_secs: u64) -> Self {
        Self {
            name: tool.name().to_string(),
            engine: tool.engine(),
            check_command: tool.check_command(),
            fix_command: tool.fix_command(),
            pass_files: tool.pass_files(),
            per_file: false,
            output: tool.output(),
            extensions: tool.extensions(),
            timeout_secs,
            enabled: true,
        }
    }

    /// Create a custom tool configuration.
    pub fn custom(name: impl Into<String>, engine: Engine, check_command: Vec<String>) -> Self {
        Self {
            name: name.into(),
            engine,
            check_command,
            fix_command: None,
            pass_files: true,
            per_file: false,
            output: OutputFormat::ExitStatus,
            extensions: Vec::new(),
            timeout_secs: default_timeout_secs(),
            enabled: true,
        }
    }

    pub fn with_fix(mut self, fix_command: Vec<String>) -> Self {
        self.fix_command = Some(fix_command);
        self
    }

    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = output;
        self
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = strings(extensions);
        self
    }

    /// Run once per file.
    pub fn per_file(mut self) -> Self {
        self.per_file = true;
        self
    }

    /// Disable this tool.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Whether the tool should look at `file`.
    pub fn applies_to(&self, file: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        file.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_secs.saturating_mul(1000)
    }
}

/// Tools used when no configuration is present.
pub fn default_tools() -> Vec<ToolSpec> {
    vec![ToolSpec::from_builtin(
        BuiltinTool::Rustfmt,
        default_timeout_secs(),
    )]
}
