//! Bamboo CLI - scaffold Go services from a template repository
//!
//! This is the main entry point for the Bamboo command-line interface.

mod cli;
mod commands;
mod output;
mod progress;

use clap::{CommandFactory, Parser};
use indicatif::MultiProgress;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Shared by the log writer and the step display
    let multi = MultiProgress::new();
    init_tracing(cli.verbose, cli.quiet, multi.clone());

    let result = match cli.command {
        Some(Commands::Init(ref args)) => {
            let options = commands::init::InitOptions {
                config_path: cli.config.as_deref(),
                verbose: cli.verbose,
                quiet: cli.quiet,
                multi,
            };
            commands::init::run(args, options).await
        }
        None => Cli::command().print_help().map_err(Into::into),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing with appropriate verbosity
///
/// `RUST_LOG` takes precedence over the flags when it is set.
fn init_tracing(verbose: u8, quiet: bool, multi: MultiProgress) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            EnvFilter::new("error")
        } else {
            EnvFilter::new(default_level(verbose))
        }
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(progress::LogWriter::new(multi)),
        )
        .with(filter)
        .init();
}

/// Default to warn so the step display stays readable; -v/-vv for detail
fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
