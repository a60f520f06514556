/// Configuration for the taskboard command front-end.
/// Reads config.json from ~/.config/taskboard/config.json (or platform equivalent).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use taskboard_core::EngineConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    /// Board data file; defaults to the platform data dir.
    #[serde(default)]
    pub data_file: Option<String>,
    /// Name of the board to open, created on first run.
    #[serde(default = "default_board")]
    pub board: String,
    #[serde(default = "default_columns")]
    pub default_columns: Vec<String>,
    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_board() -> String {
    "My Board".to_string()
}

fn default_columns() -> Vec<String> {
    vec!["To Do".to_string(), "In Progress".to_string(), "Done".to_string()]
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            board: default_board(),
            default_columns: default_columns(),
            engine: EngineConfig::default(),
        }
    }
}

impl CliConfig {
    pub fn data_file_path(&self) -> PathBuf {
        match &self.data_file {
            Some(file) => PathBuf::from(file),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("taskboard")
                .join("boards.json"),
        }
    }
}

/// Default config path: ~/.config/taskboard/config.json
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskboard")
        .join("config.json")
}

/// Load config from path. Returns default if file doesn't exist.
pub fn load_config(path: &Path) -> CliConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!(
                target: "taskboard.cli.config",
                "Failed to parse config {}: {}",
                path.display(),
                e
            );
            CliConfig::default()
        }),
        Err(_) => {
            log::info!(
                target: "taskboard.cli.config",
                "No config at {}, using defaults",
                path.display()
            );
            CliConfig::default()
        }
    }
}
