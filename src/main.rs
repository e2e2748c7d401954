//! liveedit - replay and check live edit sessions.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use liveedit::cli::{self, Cli, Commands};
use liveedit::config::{EngineConfig, init_config};
use liveedit::logger;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = init_config(EngineConfig::load(cli.config.as_deref())?);

    match &cli.command {
        Commands::Replay { args } => cli::replay::replay(args, &config).await,
        Commands::Check { before, after } => cli::check::check_edit(before, after),
    }
}
