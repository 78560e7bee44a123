//! Shared utilities for CLI commands

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Publish, SyncStatus, Workspace};

/// Locate the project (honoring `--project`) and load its configuration
pub fn open_workspace(global: &GlobalOpts) -> Result<Workspace> {
    Workspace::discover(global.project.as_deref()).map_err(|e| miette::miette!("{}", e))
}

/// Resolve `auto` for list-style output
pub fn list_format(global: &GlobalOpts) -> OutputFormat {
    match global.format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    }
}

/// Write to a file, or stdout when no path is given
pub fn write_output(content: &str, output_path: Option<&Path>) -> Result<()> {
    match output_path {
        Some(path) => {
            let file = File::create(path).into_diagnostic()?;
            let mut writer = BufWriter::new(file);
            writer.write_all(content.as_bytes()).into_diagnostic()?;
            writer.flush().into_diagnostic()?;
            println!(
                "{} Written to {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}

/// Report the mirror result of a save; failures are warnings, never errors
pub fn print_sync_status(status: &SyncStatus, quiet: bool) {
    match status {
        SyncStatus::Disabled => {}
        SyncStatus::Synced(Publish::Pushed { commit }) => {
            if !quiet {
                println!(
                    "{} Mirrored to remote ({})",
                    style("✓").green(),
                    style(&commit[..commit.len().min(8)]).dim()
                );
            }
        }
        SyncStatus::Synced(Publish::UpToDate) => {
            if !quiet {
                println!("{} Remote mirror already up to date", style("✓").green());
            }
        }
        SyncStatus::Failed(message) => {
            eprintln!(
                "{} Saved locally, but the remote mirror was not updated: {}",
                style("!").yellow(),
                message
            );
        }
    }
}
