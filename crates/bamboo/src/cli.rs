//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Bamboo - scaffold Go services from the Bamboo base template
#[derive(Parser, Debug)]
#[command(name = "bamboo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a bamboo config file (default: ~/.bamboo/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new project from the template
    Init(InitArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Go module path of the new project, e.g. github.com/acme/hello
    #[arg(value_name = "PACKAGE_NAME")]
    pub package_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_parses_module_path() {
        let cli = Cli::try_parse_from(["bamboo", "init", "github.com/acme/hello"]).unwrap();
        match cli.command {
            Some(Commands::Init(args)) => assert_eq!(args.package_name, "github.com/acme/hello"),
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "bamboo",
            "init",
            "example.com/app",
            "-vv",
            "--config",
            "/tmp/bamboo.yaml",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(Utf8PathBuf::from("/tmp/bamboo.yaml")));
    }

    #[test]
    fn test_no_subcommand_is_allowed() {
        let cli = Cli::try_parse_from(["bamboo"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_init_requires_module_path() {
        assert!(Cli::try_parse_from(["bamboo", "init"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
