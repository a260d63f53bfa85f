//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs,
    config::ConfigCommands,
    history::HistoryArgs,
    init::InitArgs,
    list::{ListArgs, ShortcutArgs},
    map::MapArgs,
    reset::ResetArgs,
    restock::RestockCommands,
    status::StatusArgs,
    upload::{PreviewArgs, UploadArgs},
};

#[derive(Parser)]
#[command(name = "stockmap")]
#[command(author, version, about = "Stock count reconciliation")]
#[command(
    long_about = "Reconciles stock count spreadsheets against the system quantities, interpreting the counters' notes (\"falta 6\", \"sobra 2\", \"2 avariados\") and keeping a local stock base with a terminal heat map."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (info-level logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .stockmap/)
    #[arg(long, global = true, env = "STOCKMAP_PROJECT")]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new stockmap project
    Init(InitArgs),

    /// Import a spreadsheet and merge it into the stock base
    Upload(UploadArgs),

    /// Parse a spreadsheet and show the rows without saving
    Preview(PreviewArgs),

    /// List stock records
    List(ListArgs),

    /// Show the stock heat map
    Map(MapArgs),

    /// List records that are short, over or damaged
    Divergences(ShortcutArgs),

    /// List damaged records
    Damaged(ShortcutArgs),

    /// Store-floor restock queue
    #[command(subcommand)]
    Restock(RestockCommands),

    /// Show the upload log
    History(HistoryArgs),

    /// Show stock base counters
    Status(StatusArgs),

    /// Delete all records, uploads and restock entries
    Reset(ResetArgs),

    /// Show configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned, colored table for the terminal
    #[default]
    Auto,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
}
