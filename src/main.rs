//! Prerender - a build-time SSR prerenderer for TSX pages.
//!
//! Synthesizes a one-shot render program from the configured pages, runs it
//! in an isolated subprocess, extracts the fenced render results from its
//! output, and splices each page's markup into the HTML template.

mod cli;
mod codegen;
mod config;
mod logger;
mod merge;
mod page;
mod pipeline;
mod protocol;
mod sandbox;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PrerenderConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    if let Commands::Build { verbose } = &cli.command {
        logger::set_verbose(*verbose);
    }

    let config = PrerenderConfig::load(&cli.config)?;

    match cli.command {
        Commands::Build { .. } => cli::build::run_build(&config),
        Commands::Validate => cli::validate::run_validate(&config),
    }
}
