use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Workspace-level knobs, loaded from a TOML table by the host application.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceSettings {
    /// Path seeded into the first pane of a fresh workspace. Empty means the
    /// workspace starts without any tab.
    #[serde(default)]
    pub default_path: String,
    /// Maximum number of tabs a single pane may hold. Zero means unlimited.
    #[serde(default)]
    pub max_tabs_per_pane: usize,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            default_path: String::new(),
            max_tabs_per_pane: 0,
        }
    }
}

impl WorkspaceSettings {
    pub fn from_toml(buf: &str) -> Result<WorkspaceSettings, ConfigError> {
        Ok(toml::from_str(buf)?)
    }

    pub fn load(path: &Path) -> Result<WorkspaceSettings, ConfigError> {
        let buf = std::fs::read_to_string(path)?;
        Self::from_toml(&buf)
    }
}
