//! Layered configuration loader
//!
//! Loads configuration with the following precedence (low to high):
//! 1. Built-in defaults
//! 2. Config file (`--config <path>`, or `~/.bamboo/config.yaml` when present)
//! 3. Environment variables (`BAMBOO_*` prefix)

use crate::config::types::BambooConfig;
use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::env;
use std::fs;
use tracing::debug;

/// File name of the user config inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.yaml";

const ENV_TEMPLATE_URL: &str = "BAMBOO_TEMPLATE_URL";
const ENV_TEMPLATE_MODULE: &str = "BAMBOO_TEMPLATE_MODULE";
const ENV_COMMAND_TIMEOUT: &str = "BAMBOO_COMMAND_TIMEOUT_SECS";
const ENV_DEFAULT_BRANCH: &str = "BAMBOO_DEFAULT_BRANCH";

/// Configuration loader
pub struct ConfigLoader {
    /// Directory searched for the implicit config file
    config_dir: Utf8PathBuf,
}

impl ConfigLoader {
    /// Create a loader rooted at `~/.bamboo`
    pub fn new() -> Result<Self> {
        let config_dir = Self::default_config_dir()?;
        Ok(Self { config_dir })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    /// Get the standard config directory (~/.bamboo)
    ///
    /// HOME wins over the passwd entry so overrides in containers and tests apply.
    fn default_config_dir() -> Result<Utf8PathBuf> {
        let home = match env::var("HOME").or_else(|_| env::var("USERPROFILE")) {
            Ok(home) => Utf8PathBuf::from(home),
            Err(_) => dirs::home_dir()
                .and_then(|dir| Utf8PathBuf::from_path_buf(dir).ok())
                .ok_or_else(|| Error::invalid_config("Could not determine home directory"))?,
        };

        Ok(home.join(".bamboo"))
    }

    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the implicit config file is
    /// optional.
    pub fn load(&self, explicit: Option<&Utf8Path>) -> Result<BambooConfig> {
        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::config_not_found(path.as_str()));
                }
                Self::load_yaml_file(path)?
            }
            None => {
                let path = self.config_file();
                if path.exists() {
                    Self::load_yaml_file(&path)?
                } else {
                    debug!("No config file at {}, using defaults", path);
                    BambooConfig::default()
                }
            }
        };

        config = Self::apply_env_overrides(config, |key| env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Load a YAML file and parse it
    fn load_yaml_file(path: &Utf8Path) -> Result<BambooConfig> {
        debug!("Loading config from {}", path);
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(BambooConfig::default());
        }
        serde_yaml_ng::from_str(&content).map_err(|e| Error::yaml_parse(path.as_str(), e))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides<F>(mut config: BambooConfig, lookup: F) -> Result<BambooConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup(ENV_TEMPLATE_URL) {
            config.template.repo_url = val;
        }

        if let Some(val) = lookup(ENV_TEMPLATE_MODULE) {
            config.template.module = val;
        }

        if let Some(val) = lookup(ENV_COMMAND_TIMEOUT) {
            config.command.timeout_secs = val.trim().parse().map_err(|_| {
                Error::invalid_config(format!("{} must be a valid number", ENV_COMMAND_TIMEOUT))
            })?;
        }

        if let Some(val) = lookup(ENV_DEFAULT_BRANCH) {
            config.git.default_branch = val;
        }

        Ok(config)
    }

    /// Path of the implicit config file
    pub fn config_file(&self) -> Utf8PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}
