//! # bamboo-core
//!
//! Core library for the Bamboo CLI providing:
//! - Runtime configuration (built-in defaults, `~/.bamboo/config.yaml`, `BAMBOO_*` overrides)
//! - Shared error types

pub mod config;
pub mod error;

pub use config::{BambooConfig, CommandConfig, ConfigLoader, GitConfig, TemplateConfig};
pub use error::{Error, Result};
