//! Repository initialization with a fixed initial branch

use crate::error::{Error, Result};
use crate::git::GIT;
use crate::process::CommandRunner;
use camino::Utf8Path;
use tracing::{debug, info, warn};

/// Which mechanism ended up setting the initial branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// `git init -b <branch>`
    InitialBranchFlag,
    /// `git init` then `git symbolic-ref HEAD`
    SymbolicRef,
    /// `git init` then `git branch -M`
    BranchRename,
}

/// Initialize a repository at `path` whose first branch is `branch`
///
/// Older git versions lack `-b`, so this falls back to a plain `git init`
/// followed by repointing HEAD, and finally to renaming the branch.
///
/// # Errors
/// Returns error if:
/// - Plain `git init` fails
/// - Both the symbolic-ref and the rename attempt fail (the symbolic-ref
///   error is reported)
pub async fn init_repository(
    runner: &dyn CommandRunner,
    path: &Utf8Path,
    branch: &str,
) -> Result<InitOutcome> {
    info!("Initializing git repository at {} on branch {}", path, branch);

    match runner.run(Some(path), GIT, &["init", "-b", branch]).await {
        Ok(()) => return Ok(InitOutcome::InitialBranchFlag),
        Err(e) => warn!("git init -b {} failed, falling back: {}", branch, e),
    }

    runner
        .run(Some(path), GIT, &["init"])
        .await
        .map_err(|e| Error::step_failed("initialize git repository failed", e))?;

    let head = format!("refs/heads/{}", branch);
    let symref_err = match runner
        .run(Some(path), GIT, &["symbolic-ref", "HEAD", &head])
        .await
    {
        Ok(()) => return Ok(InitOutcome::SymbolicRef),
        Err(e) => e,
    };

    debug!("git symbolic-ref failed, trying branch rename: {}", symref_err);
    match runner.run(Some(path), GIT, &["branch", "-M", branch]).await {
        Ok(()) => Ok(InitOutcome::BranchRename),
        Err(rename_err) => {
            debug!("git branch -M failed: {}", rename_err);
            Err(Error::step_failed(
                "set git default branch failed",
                symref_err,
            ))
        }
    }
}
