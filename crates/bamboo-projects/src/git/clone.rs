//! Repository cloning

use crate::error::Result;
use crate::git::GIT;
use crate::process::CommandRunner;
use camino::Utf8Path;
use tracing::info;

/// Options for cloning a repository
#[derive(Debug, Clone)]
pub struct CloneOptions {
    /// History depth
    pub depth: u32,
}

impl Default for CloneOptions {
    fn default() -> Self {
        Self { depth: 1 }
    }
}

/// Clone `url` into `destination` keeping only the latest history
///
/// Runs from the current directory; `destination` must not exist yet.
pub async fn clone_shallow(
    runner: &dyn CommandRunner,
    url: &str,
    destination: &Utf8Path,
    options: &CloneOptions,
) -> Result<()> {
    info!("Cloning repository: {} -> {}", url, destination);

    let depth = format!("--depth={}", options.depth);
    runner
        .run(None, GIT, &["clone", &depth, url, destination.as_str()])
        .await?;

    info!("Repository cloned successfully");
    Ok(())
}
