//! `.gatekeep.json` loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gatekeep_core::{ClassifierConfig, PartialStagingPolicy, StagingConfig};
use gatekeep_tools::{default_tools, ToolSpec};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Config file looked up at the repository root.
pub const CONFIG_FILE: &str = ".gatekeep.json";

/// Gate configuration. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub tools: Vec<ToolSpec>,
    pub classifier: ClassifierConfig,
    pub staging: StagingConfig,
    pub partial_staging: PartialStagingPolicy,

    /// Run fixers when the decision asks for it.
    pub attempt_fix: bool,

    /// Upper bound on concurrent file reads and per-file tool runs.
    pub max_concurrency: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            tools: default_tools(),
            classifier: ClassifierConfig::default(),
            staging: StagingConfig::default(),
            partial_staging: PartialStagingPolicy::default(),
            attempt_fix: true,
            max_concurrency: 8,
        }
    }
}

impl GateConfig {
    /// Load `explicit`, or `<root>/.gatekeep.json` when it exists.
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path: PathBuf = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = root.join(CONFIG_FILE);
                if !path.exists() {
                    debug!(root = %root.display(), "no config file, using defaults");
                    return Ok(Self::default());
                }
                path
            }
        };

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        debug!(path = %path.display(), tools = config.tools.len(), "loaded config");
        Ok(config)
    }
}
