//! `bamboo init` command handler

use anyhow::{anyhow, Result};
use bamboo_core::ConfigLoader;
use bamboo_projects::sequencer::{RunObserver, TracingObserver};
use bamboo_projects::{initialize, Error, SystemCommandRunner};
use camino::{Utf8Path, Utf8PathBuf};
use indicatif::MultiProgress;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cli::InitArgs;
use crate::output;
use crate::progress::StepProgress;

/// Global flags and shared terminal state for `init`
pub struct InitOptions<'a> {
    pub config_path: Option<&'a Utf8Path>,
    pub verbose: u8,
    pub quiet: bool,
    pub multi: MultiProgress,
}

/// Scaffold a new project in the current directory
pub async fn run(args: &InitArgs, options: InitOptions<'_>) -> Result<()> {
    let InitOptions {
        config_path,
        verbose,
        quiet,
        multi,
    } = options;

    let config = ConfigLoader::new()?.load(config_path)?;
    let work_dir = current_dir()?;
    debug!("Working directory: {}", work_dir);

    if !quiet {
        output::header("Bamboo init");
        output::kv("Module", args.package_name.trim());
        output::kv("Template", &config.template.repo_url);
        println!();
    }

    let observer = select_observer(verbose, quiet, multi);
    let runner = Arc::new(SystemCommandRunner::new(config.command.timeout()));

    let outcome = initialize(
        &args.package_name,
        &work_dir,
        &config,
        runner,
        observer.as_ref(),
        interrupted(),
    )
    .await;

    let target = match outcome {
        Ok(target) => target,
        Err(Error::Cancelled) => {
            output::warning(
                "Interrupted. A command that was already running may still finish in the background.",
            );
            return Err(Error::Cancelled.into());
        }
        Err(e) => return Err(e.into()),
    };

    println!();
    output::success("Done.");
    output::kv("Project", target.project_dir.as_str());
    if !quiet {
        if let Some(name) = target.project_dir.file_name() {
            output::info(&format!("Next: {}", output::next_steps_hint(name)));
        }
    }
    Ok(())
}

/// Spinner lines on an interactive terminal, log lines otherwise
fn select_observer(verbose: u8, quiet: bool, multi: MultiProgress) -> Box<dyn RunObserver> {
    if use_interactive_progress(console::Term::stderr().is_term(), verbose, quiet) {
        Box::new(StepProgress::new(multi))
    } else {
        Box::new(TracingObserver::new())
    }
}

fn use_interactive_progress(is_term: bool, verbose: u8, quiet: bool) -> bool {
    is_term && verbose == 0 && !quiet
}

fn current_dir() -> Result<Utf8PathBuf> {
    let dir = std::env::current_dir()
        .map_err(|e| anyhow!("failed to read current directory: {}", e))?;
    Utf8PathBuf::from_path_buf(dir)
        .map_err(|p| anyhow!("current directory is not valid UTF-8: {}", p.display()))
}

/// Resolves on the first Ctrl-C; never resolves if the handler cannot be installed
async fn interrupted() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => warn!("Interrupt received, cancelling run"),
        Err(e) => {
            warn!("Ctrl-C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
