use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::CommonResult;

pub const DEFAULT_CONFIG_NAME: &str = "easel.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Prefix for generated node ids
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,

    /// Undo/redo tuning
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConfig {
    /// Maximum number of undo entries kept (0 = unlimited)
    #[serde(default = "default_max_levels")]
    pub max_levels: usize,

    /// Successive records within this window merge into one entry (0 = off)
    #[serde(default)]
    pub coalesce_window_ms: u64,
}

fn default_id_prefix() -> String {
    "node".to_string()
}

fn default_max_levels() -> usize {
    100
}

impl EditorConfig {
    /// Load config from a directory, falling back to defaults when absent
    pub fn load(cwd: impl AsRef<Path>) -> CommonResult<Self> {
        let config_path = Self::path_in(cwd);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json_str(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_json_str(json: &str) -> CommonResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn path_in(cwd: impl AsRef<Path>) -> PathBuf {
        cwd.as_ref().join(DEFAULT_CONFIG_NAME)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            id_prefix: default_id_prefix(),
            history: HistoryConfig::default(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_levels: default_max_levels(),
            coalesce_window_ms: 0,
        }
    }
}
