//! Git operations used while scaffolding
//!
//! Every operation shells out to `git` through a [`CommandRunner`], so the
//! same code runs against the real binary or a recording fake.
//!
//! [`CommandRunner`]: crate::process::CommandRunner

mod clone;
mod init;

pub use clone::{clone_shallow, CloneOptions};
pub use init::{init_repository, InitOutcome};

/// Name of the git binary
pub const GIT: &str = "git";
