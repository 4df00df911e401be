//! Runtime configuration types
//!
//! Every field carries a default so that a partial YAML file only overrides
//! the keys it names.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

/// Complete runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BambooConfig {
    /// Template repository settings
    #[serde(default)]
    pub template: TemplateConfig,

    /// External command settings
    #[serde(default)]
    pub command: CommandConfig,

    /// Git settings for the new repository
    #[serde(default)]
    pub git: GitConfig,
}

impl BambooConfig {
    /// Reject values that would make a scaffold run meaningless
    pub fn validate(&self) -> Result<()> {
        if self.template.repo_url.trim().is_empty() {
            return Err(Error::invalid_config("template.repo-url must not be empty"));
        }
        if self.template.module.trim().is_empty() {
            return Err(Error::invalid_config("template.module must not be empty"));
        }
        if self.template.clone_depth == 0 {
            return Err(Error::invalid_config(
                "template.clone-depth must be greater than zero",
            ));
        }
        if self.template.tidy_command.is_empty()
            || self.template.tidy_command[0].trim().is_empty()
        {
            return Err(Error::invalid_config(
                "template.tidy-command must name a program",
            ));
        }
        if self.command.timeout_secs == 0 {
            return Err(Error::invalid_config(
                "command.timeout-secs must be greater than zero",
            ));
        }
        if self.git.default_branch.trim().is_empty() {
            return Err(Error::invalid_config("git.default-branch must not be empty"));
        }
        Ok(())
    }
}

/// Template repository configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TemplateConfig {
    /// Clone URL of the template repository
    #[serde(default = "default_repo_url")]
    pub repo_url: String,

    /// Module path the template uses to refer to itself
    #[serde(default = "default_module")]
    pub module: String,

    /// History depth for the shallow clone
    #[serde(default = "default_clone_depth")]
    pub clone_depth: u32,

    /// Dependency resolution command, program first
    #[serde(default = "default_tidy_command")]
    pub tidy_command: Vec<String>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            repo_url: default_repo_url(),
            module: default_module(),
            clone_depth: default_clone_depth(),
            tidy_command: default_tidy_command(),
        }
    }
}

fn default_repo_url() -> String {
    "https://github.com/bamboo-services/bamboo-base-go-template".to_string()
}
fn default_module() -> String {
    "github.com/bamboo-services/bamboo-base-go-template".to_string()
}
fn default_clone_depth() -> u32 {
    1
}
fn default_tidy_command() -> Vec<String> {
    vec!["go".to_string(), "mod".to_string(), "tidy".to_string()]
}

/// External command configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandConfig {
    /// Hard timeout for a single external command in seconds
    #[serde(default = "default_command_timeout")]
    pub timeout_secs: u64,
}

impl CommandConfig {
    /// Timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_command_timeout(),
        }
    }
}

fn default_command_timeout() -> u64 {
    180
}

/// Git configuration for the reinitialized repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitConfig {
    /// Initial branch name
    #[serde(default = "default_git_branch")]
    pub default_branch: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            default_branch: default_git_branch(),
        }
    }
}

fn default_git_branch() -> String {
    "master".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = BambooConfig::default();
        assert_eq!(
            config.template.repo_url,
            "https://github.com/bamboo-services/bamboo-base-go-template"
        );
        assert_eq!(
            config.template.module,
            "github.com/bamboo-services/bamboo-base-go-template"
        );
        assert_eq!(config.template.clone_depth, 1);
        assert_eq!(config.template.tidy_command, vec!["go", "mod", "tidy"]);
        assert_eq!(config.command.timeout(), Duration::from_secs(180));
        assert_eq!(config.git.default_branch, "master");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "command:\n  timeout-secs: 30\ngit:\n  default-branch: trunk\n";
        let config: BambooConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.command.timeout_secs, 30);
        assert_eq!(config.git.default_branch, "trunk");
        assert_eq!(config.template, TemplateConfig::default());
    }

    #[test]
    fn test_yaml_uses_kebab_case() {
        let yaml = serde_yaml_ng::to_string(&BambooConfig::default()).unwrap();
        assert!(yaml.contains("repo-url:"));
        assert!(yaml.contains("clone-depth: 1"));
        assert!(yaml.contains("timeout-secs: 180"));
        assert!(yaml.contains("default-branch: master"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = BambooConfig::default();
        config.command.timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout-secs"));
    }

    #[test]
    fn test_validate_rejects_empty_tidy_command() {
        let mut config = BambooConfig::default();
        config.template.tidy_command.clear();
        assert!(config.validate().is_err());

        config.template.tidy_command = vec!["  ".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_branch() {
        let mut config = BambooConfig::default();
        config.git.default_branch = " ".to_string();
        assert!(config.validate().is_err());
    }
}
