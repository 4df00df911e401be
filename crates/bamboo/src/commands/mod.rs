//! CLI command implementations

pub mod init;
