//! Agent hook payload parsing.
//!
//! Post-edit hooks receive a JSON object on stdin describing the tool call
//! that just ran. Only the edited file matters to the gate.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ToolInput {
    #[serde(default)]
    pub file_path: Option<String>,

    #[serde(default)]
    pub notebook_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HookPayload {
    #[serde(default)]
    pub session_id: Option<String>,

    #[serde(default)]
    pub hook_event_name: Option<String>,

    #[serde(default)]
    pub tool_name: Option<String>,

    #[serde(default)]
    pub tool_input: ToolInput,

    /// Working directory of the agent session.
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

impl HookPayload {
    pub fn parse(input: &str) -> Result<Self> {
        serde_json::from_str(input).context("Invalid hook payload on stdin")
    }

    /// The edited file, resolved against the session directory (or
    /// `fallback_cwd`) when relative.
    pub fn target_file(&self, fallback_cwd: &Path) -> Option<PathBuf> {
        let raw = self
            .tool_input
            .file_path
            .as_deref()
            .or(self.tool_input.notebook_path.as_deref())
            .filter(|p| !p.trim().is_empty())?;

        let path = PathBuf::from(raw);
        if path.is_absolute() {
            return Some(path);
        }
        let base = self.cwd.as_deref().unwrap_or(fallback_cwd);
        Some(base.join(path))
    }
}
