//! Mock engine, definition files and logging configuration.

use super::listen::default_true;
use crate::mock::MockOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MockConfig {
    #[serde(default)]
    pub collections: CollectionsConfig,
    #[serde(default)]
    pub routes: RoutesConfig,
    /// Reject a whole load when any definition is invalid
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CollectionsConfig {
    /// Collection activated on start; the first one loaded when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RoutesConfig {
    /// Global response delay in milliseconds
    #[serde(default)]
    pub delay: u64,
}

impl MockConfig {
    pub fn options(&self) -> MockOptions {
        MockOptions {
            selected_collection: self.collections.selected.clone(),
            delay: self.routes.delay,
            strict: self.strict,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilesConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Folder holding `collections.*` and `routes/`
    #[serde(default = "default_files_path")]
    pub path: PathBuf,
    /// Reload definitions when files change
    #[serde(default = "default_true")]
    pub watch: bool,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_files_path(),
            watch: true,
        }
    }
}

fn default_files_path() -> PathBuf {
    PathBuf::from("mocks")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
