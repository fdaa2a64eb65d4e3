use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration from grocery/config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing-subscriber` filter directive; `GL_LOG` takes precedence
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Log file used by the TUI, relative to the grocery/ directory
    #[serde(default = "default_log_file")]
    pub file: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: default_log_filter(),
            file: default_log_file(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "gl.log".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Show the raw position key next to each row
    #[serde(default)]
    pub show_positions: bool,
    /// Color overrides by theme slot name (e.g. `highlight = "#FB4196"`)
    #[serde(default)]
    pub colors: HashMap<String, String>,
}
