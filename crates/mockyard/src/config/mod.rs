//! Configuration types for mockyard.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration. Command line flags are applied on top by the binary.

mod listen;
mod mock;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use listen::{AdminConfig, ServerConfig};
pub use mock::{CollectionsConfig, FilesConfig, LogConfig, MockConfig, RoutesConfig};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub mock: MockConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Read a YAML (or JSON) configuration file and validate it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, anyhow::Error> {
        // an empty document deserializes to unit, not to an empty map
        let config: Config = if contents.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(contents)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server.port == 0 {
            anyhow::bail!("'server.port' must be greater than 0");
        }
        if self.admin.enabled {
            if self.admin.port == 0 {
                anyhow::bail!("'admin.port' must be greater than 0");
            }
            if self.admin.port == self.server.port {
                anyhow::bail!(
                    "'admin.port' and 'server.port' must be different (both are {})",
                    self.server.port
                );
            }
        }
        self.server.addr()?;
        if self.admin.enabled {
            self.admin.addr()?;
        }
        if self.files.enabled && self.files.path.as_os_str().is_empty() {
            anyhow::bail!("'files.path' must not be empty when files are enabled");
        }
        Ok(())
    }
}
