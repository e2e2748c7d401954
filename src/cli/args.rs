//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Live edit engine: incremental hot-swap compilation for running apps
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Print debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (default: search upward for liveedit.toml)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Replay a recorded edit session against a scripted device
    #[command(visible_alias = "r")]
    Replay {
        #[command(flatten)]
        args: ReplayArgs,
    },

    /// Check whether an edit between two syntax trees can be hot-swapped
    #[command(visible_alias = "c")]
    Check {
        /// Tree before the edit (JSON)
        #[arg(value_hint = clap::ValueHint::FilePath)]
        before: PathBuf,

        /// Tree after the edit (JSON)
        #[arg(value_hint = clap::ValueHint::FilePath)]
        after: PathBuf,
    },
}

/// Replay command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct ReplayArgs {
    /// Session script (JSON)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub script: PathBuf,

    /// Write every pushed patch to this file, one JSON message per line
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Compile only on explicit `trigger` steps
    #[arg(short, long)]
    pub manual: bool,
}
