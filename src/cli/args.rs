//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::{net::IpAddr, path::PathBuf};

/// Static site asset pipeline with a live-reloading dev server
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: sitepipe.toml, optional)
    #[arg(short = 'C', long, global = true, default_value = "sitepipe.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Project root (default: directory of the config file, or cwd)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Port number to listen on
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long, global = true)]
    pub interface: Option<IpAddr>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The subcommand to run; no subcommand means `dev`.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Dev)
    }
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Full build, then serve with live reload and watch sources (default)
    #[command(visible_alias = "d")]
    Dev,

    /// Full build only, then exit
    #[command(visible_alias = "b")]
    Build,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_is_dev() {
        let cli = Cli::parse_from(["sitepipe"]);
        assert_eq!(cli.command(), Commands::Dev);
        assert_eq!(cli.config, PathBuf::from("sitepipe.toml"));
    }

    #[test]
    fn test_build_with_overrides() {
        let cli = Cli::parse_from(["sitepipe", "build", "-p", "8080", "-i", "0.0.0.0", "-v"]);
        assert_eq!(cli.command(), Commands::Build);
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.interface, Some("0.0.0.0".parse().unwrap()));
        assert!(cli.verbose);
    }

    #[test]
    fn test_root_and_config() {
        let cli = Cli::parse_from(["sitepipe", "-r", "site", "-C", "other.toml", "dev"]);
        assert_eq!(cli.root, Some(PathBuf::from("site")));
        assert_eq!(cli.config, PathBuf::from("other.toml"));
    }
}
