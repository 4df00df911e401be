//! Configuration loading and types

mod loader;
mod types;

pub use loader::{ConfigLoader, CONFIG_FILE_NAME};
pub use types::{BambooConfig, CommandConfig, GitConfig, TemplateConfig};
