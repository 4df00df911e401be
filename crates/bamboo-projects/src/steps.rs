//! The scaffold plan: the fixed, ordered steps of `bamboo init`

use crate::error::{Error, Result};
use crate::git::{self, CloneOptions};
use crate::process::{format_command, CommandRunner};
use crate::rewrite::{rewrite_tree, VCS_DIR};
use crate::sequencer::{Step, StepAction, StepFuture};
use crate::target::ProjectTarget;
use bamboo_core::{GitConfig, TemplateConfig};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Everything the scaffold steps read
pub struct ScaffoldContext {
    pub target: ProjectTarget,
    pub template: TemplateConfig,
    pub git: GitConfig,
    pub runner: Arc<dyn CommandRunner>,
}

impl fmt::Debug for ScaffoldContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScaffoldContext")
            .field("target", &self.target)
            .field("template", &self.template)
            .field("git", &self.git)
            .finish_non_exhaustive()
    }
}

/// One step of the scaffold plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaffoldStep {
    CloneTemplate,
    RemoveTemplateMetadata,
    RewriteModulePath,
    InitRepository,
    TidyModule,
}

impl ScaffoldStep {
    /// Steps in execution order
    pub const ALL: [ScaffoldStep; 5] = [
        ScaffoldStep::CloneTemplate,
        ScaffoldStep::RemoveTemplateMetadata,
        ScaffoldStep::RewriteModulePath,
        ScaffoldStep::InitRepository,
        ScaffoldStep::TidyModule,
    ];

    /// Display name shown to the user
    pub fn name(&self, ctx: &ScaffoldContext) -> String {
        match self {
            ScaffoldStep::CloneTemplate => "Clone template repository".to_string(),
            ScaffoldStep::RemoveTemplateMetadata => "Remove template .git metadata".to_string(),
            ScaffoldStep::RewriteModulePath => "Rewrite module path".to_string(),
            ScaffoldStep::InitRepository => {
                format!("Initialize new Git repository ({})", ctx.git.default_branch)
            }
            ScaffoldStep::TidyModule => format!("Run {}", ctx.template.tidy_command.join(" ")),
        }
    }

    async fn execute(self, ctx: Arc<ScaffoldContext>) -> Result<()> {
        match self {
            ScaffoldStep::CloneTemplate => clone_template(&ctx).await,
            ScaffoldStep::RemoveTemplateMetadata => {
                remove_template_metadata(&ctx.target.project_dir).await
            }
            ScaffoldStep::RewriteModulePath => rewrite_module_path(&ctx).await,
            ScaffoldStep::InitRepository => {
                git::init_repository(
                    ctx.runner.as_ref(),
                    &ctx.target.project_dir,
                    &ctx.git.default_branch,
                )
                .await?;
                Ok(())
            }
            ScaffoldStep::TidyModule => tidy_module(&ctx).await,
        }
    }
}

impl StepAction<ScaffoldContext> for ScaffoldStep {
    fn run(&self, ctx: Arc<ScaffoldContext>) -> StepFuture {
        Box::pin(self.execute(ctx))
    }
}

/// Build the ordered step list for a scaffold run
pub fn scaffold_plan(ctx: &ScaffoldContext) -> Vec<Step<ScaffoldContext>> {
    ScaffoldStep::ALL
        .into_iter()
        .map(|step| Step::new(step.name(ctx), step))
        .collect()
}

async fn clone_template(ctx: &ScaffoldContext) -> Result<()> {
    ctx.target.ensure_absent()?;

    let options = CloneOptions {
        depth: ctx.template.clone_depth,
    };
    git::clone_shallow(
        ctx.runner.as_ref(),
        &ctx.template.repo_url,
        &ctx.target.project_dir,
        &options,
    )
    .await
    .map_err(|e| Error::step_failed("clone template repository failed", e))
}

async fn remove_template_metadata(project_dir: &camino::Utf8Path) -> Result<()> {
    let git_dir = project_dir.join(VCS_DIR);
    match tokio::fs::remove_dir_all(&git_dir).await {
        Ok(()) => {
            debug!("Removed {}", git_dir);
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::step_failed(
            "remove template .git directory failed",
            Error::file_io("remove", git_dir.as_str(), e),
        )),
    }
}

async fn rewrite_module_path(ctx: &ScaffoldContext) -> Result<()> {
    let root = ctx.target.project_dir.clone().into_std_path_buf();
    let search = ctx.template.module.clone();
    let replacement = ctx.target.module_path.clone();

    let stats = tokio::task::spawn_blocking(move || rewrite_tree(&root, &search, &replacement))
        .await
        .map_err(|_| Error::step_panicked("Rewrite module path"))??;

    info!(
        "{} of {} eligible files now reference {}",
        stats.files_rewritten, stats.files_scanned, ctx.target.module_path
    );
    Ok(())
}

async fn tidy_module(ctx: &ScaffoldContext) -> Result<()> {
    let Some((program, rest)) = ctx.template.tidy_command.split_first() else {
        return Err(Error::Config(bamboo_core::Error::invalid_config(
            "template.tidy-command must name a program",
        )));
    };
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();

    let command_line = format_command(program, &args);
    debug!("Tidying module with {}", command_line);
    ctx.runner
        .run(Some(&ctx.target.project_dir), program, &args)
        .await
        .map_err(|e| Error::step_failed(format!("run {} failed", command_line), e))
}
