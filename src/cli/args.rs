//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Prerender CLI: render TSX pages at build time and splice them into your
/// HTML shell.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: prerender.toml)
    #[arg(short = 'C', long, default_value = "prerender.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Prerender all configured pages
    #[command(visible_alias = "b")]
    Build {
        /// Enable verbose output for debugging
        #[arg(short = 'V', long)]
        verbose: bool,
    },

    /// Validate configuration without rendering
    #[command(visible_alias = "v")]
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build() {
        let cli = Cli::parse_from(["prerender", "build", "-V"]);
        assert!(matches!(cli.command, Commands::Build { verbose: true }));
        assert_eq!(cli.config, PathBuf::from("prerender.toml"));
    }

    #[test]
    fn test_parse_validate_with_config() {
        let cli = Cli::parse_from(["prerender", "-C", "site/prerender.toml", "validate"]);
        assert!(matches!(cli.command, Commands::Validate));
        assert_eq!(cli.config, PathBuf::from("site/prerender.toml"));
    }
}
