//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    backup::BackupCommands, completions::CompletionsArgs, config::ConfigCommands,
    init::InitArgs, order::OrderCommands, reference::RefCommands, sync::SyncArgs,
};

#[derive(Parser)]
#[command(name = "creq")]
#[command(author, version, about = "Cable requisition orders for production racks")]
#[command(long_about = "Record cable orders against the rack reference spreadsheet, keep them in an order workbook with rotating backups, and mirror both files to a git remote.")]
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

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .creq/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new creq project
    Init(InitArgs),

    /// Browse the reference spreadsheet
    #[command(subcommand)]
    Ref(RefCommands),

    /// Create, list and update orders
    #[command(subcommand)]
    Order(OrderCommands),

    /// Inspect and restore order store backups
    #[command(subcommand)]
    Backup(BackupCommands),

    /// Mirror the spreadsheets to the configured git remote now
    Sync(SyncArgs),

    /// Show configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (pretty for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}
