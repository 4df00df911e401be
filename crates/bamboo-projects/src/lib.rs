//! # bamboo-projects
//!
//! Project scaffolding library for the Bamboo CLI providing:
//! - Module path validation and project directory resolution
//! - Timeout-bounded external commands behind a [`CommandRunner`] trait
//! - Git clone and reinitialization on top of the runner
//! - Literal token rewriting across a project tree
//! - A sequential, observable, cancellable step engine
//!
//! # Examples
//!
//! ## Scaffold a project
//!
//! ```no_run
//! use bamboo_core::BambooConfig;
//! use bamboo_projects::process::SystemCommandRunner;
//! use bamboo_projects::sequencer::TracingObserver;
//! use camino::Utf8Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BambooConfig::default();
//! let runner = Arc::new(SystemCommandRunner::new(config.command.timeout()));
//! let target = bamboo_projects::initialize(
//!     "github.com/acme/hello",
//!     Utf8Path::new("/tmp"),
//!     &config,
//!     runner,
//!     &TracingObserver::new(),
//!     std::future::pending(),
//! )
//! .await?;
//! println!("created {}", target.project_dir);
//! # Ok(())
//! # }
//! ```
//!
//! ## Rewrite a module path in place
//!
//! ```no_run
//! use bamboo_projects::rewrite::rewrite_tree;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let stats = rewrite_tree(Path::new("./hello"), "github.com/old/module", "github.com/acme/hello")?;
//! println!("{} files rewritten", stats.files_rewritten);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod git;
pub mod process;
pub mod rewrite;
pub mod sequencer;
pub mod steps;
pub mod target;

pub use error::{Error, Result};
pub use process::{CommandRunner, SystemCommandRunner};
pub use sequencer::{RunObserver, RunSummary, Sequencer, Step, StepStatus};
pub use steps::{scaffold_plan, ScaffoldContext, ScaffoldStep};
pub use target::ProjectTarget;

use bamboo_core::BambooConfig;
use camino::Utf8Path;
use std::future::Future;
use std::sync::Arc;
use tracing::info;

/// Scaffold `module_path` under `work_dir`
///
/// Validation and the target directory check happen before any command runs.
/// Returns the resolved target on success, or the first failing step's error.
pub async fn initialize<F>(
    module_path: &str,
    work_dir: &Utf8Path,
    config: &BambooConfig,
    runner: Arc<dyn CommandRunner>,
    observer: &dyn RunObserver,
    cancel: F,
) -> Result<ProjectTarget>
where
    F: Future<Output = ()>,
{
    let target = ProjectTarget::resolve(module_path, work_dir)?;
    target.ensure_absent()?;

    info!(
        "Scaffolding {} into {}",
        target.module_path, target.project_dir
    );

    let context = ScaffoldContext {
        target: target.clone(),
        template: config.template.clone(),
        git: config.git.clone(),
        runner,
    };
    let steps = scaffold_plan(&context);

    Sequencer::new(steps, Arc::new(context))
        .run(observer, cancel)
        .await
        .into_result()?;

    Ok(target)
}
