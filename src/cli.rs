use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "converge")]
#[command(version)]
#[command(about = "Converge files, directories and symlinks to a declared state", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Manifest to read instead of the one in the config directory
    #[arg(short, long, global = true, env = "CONVERGE_MANIFEST")]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show which declared values differ from the current state
    Status(TargetArgs),

    /// Preview what apply would change
    Diff(TargetArgs),

    /// Make the current state match the manifest
    Apply(ApplyArgs),

    /// Show every property of the declared resources
    Show(ShowArgs),

    /// List resource types and their properties
    Schemas,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
pub struct TargetArgs {
    /// Only resources matching `type` or `type.name` (e.g. `file.gitconfig`)
    pub target: Option<String>,
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Only resources matching `type` or `type.name`
    pub target: Option<String>,

    /// Dry run - show what would be done
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Only resources matching `type` or `type.name`
    pub target: Option<String>,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}
