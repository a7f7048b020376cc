use std::path::PathBuf;

use clap::Parser;

pub mod root_commands;

pub use root_commands::{Commands, ServeArgs};

/// Top-level CLI parser for the `tally` binary.
#[derive(Debug, Parser)]
#[command(name = "tally", version, about = "Tally - task tracking service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ./tally.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use pretty_assertions::assert_eq;

    use super::{Cli, Commands};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_accepts_bind_override() {
        let cli = Cli::try_parse_from(["tally", "serve", "--bind", "127.0.0.1:8080"]).unwrap();
        match cli.command {
            Commands::Serve(args) => assert_eq!(args.bind.as_deref(), Some("127.0.0.1:8080")),
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["tally", "init-db", "--config", "ops.toml", "-v"]).unwrap();
        assert!(matches!(cli.command, Commands::InitDb));
        assert_eq!(cli.config.unwrap().to_str(), Some("ops.toml"));
        assert!(cli.verbose);
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(Cli::try_parse_from(["tally", "hosts", "-q", "-v"]).is_err());
    }
}
