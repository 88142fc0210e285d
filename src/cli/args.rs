//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `analyze`: Discover state-key declarations, setter usages, and style
//!   tokens, then print the variant manifest.

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }
}

/// Common arguments shared by all commands.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Source code root directory (overrides config file)
    #[arg(long)]
    pub source_root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct AnalyzeCommand {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Print the manifest as JSON instead of the human-readable report
    #[arg(long)]
    pub json: bool,

    /// Additional key for the token scanner to search for.
    /// Can be specified multiple times: --extra-key density --extra-key motion
    #[arg(long = "extra-key", value_name = "KEY")]
    pub extra_keys: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze the project and print the variant manifest
    Analyze(AnalyzeCommand),
}
