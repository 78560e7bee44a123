//! `creq backup` command - Order store snapshots

use clap::Subcommand;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};
use std::io::IsTerminal;

use crate::cli::commands::utils::{list_format, open_workspace};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::entities::TIMESTAMP_FORMAT;

#[derive(Subcommand, Debug)]
pub enum BackupCommands {
    /// List backups, newest first
    List,

    /// Replace the order store with a backup
    Restore(RestoreArgs),
}

#[derive(clap::Args, Debug)]
pub struct RestoreArgs {
    /// Backup file name (see `creq backup list`)
    pub name: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: BackupCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        BackupCommands::List => run_list(global),
        BackupCommands::Restore(args) => run_restore(args, global),
    }
}

#[derive(serde::Serialize)]
struct BackupRow {
    name: String,
    taken_at: String,
    path: String,
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let store = workspace.order_store();
    let entries = store
        .backups()
        .list()
        .map_err(|e| miette::miette!("{}", e))?;

    if entries.is_empty() {
        if !global.quiet {
            println!(
                "No backups in {}",
                style(store.backups().dir().display()).cyan()
            );
        }
        return Ok(());
    }

    let rows: Vec<BackupRow> = entries
        .iter()
        .map(|e| BackupRow {
            name: e.name.clone(),
            taken_at: e
                .taken_at
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
            path: e.path.display().to_string(),
        })
        .collect();

    match list_format(global) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&rows).into_diagnostic()?);
        }
        OutputFormat::Csv => {
            crate::cli::helpers::write_csv(&rows, std::io::stdout())?;
        }
        OutputFormat::Id => {
            for row in &rows {
                println!("{}", row.name);
            }
        }
        OutputFormat::Md => {
            let table = crate::cli::helpers::markdown_table(
                &["Backup", "Taken"],
                rows.iter().map(|r| vec![r.name.clone(), r.taken_at.clone()]),
            );
            println!("{}", table);
        }
        OutputFormat::Tsv | OutputFormat::Auto => {
            println!(
                "{:<40} {}",
                style("BACKUP").bold(),
                style("TAKEN").bold()
            );
            for row in &rows {
                println!(
                    "{:<40} {}",
                    style(&row.name).cyan(),
                    crate::cli::helpers::or_dash(&row.taken_at)
                );
            }
            if !global.quiet {
                println!();
                println!(
                    "{} backup(s) in {}",
                    style(rows.len()).cyan(),
                    style(store.backups().dir().display()).dim()
                );
            }
        }
    }

    Ok(())
}

fn run_restore(args: RestoreArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;
    let store = workspace.order_store();

    if !args.yes {
        if !std::io::stdin().is_terminal() {
            return Err(miette::miette!(
                help = "pass --yes to restore without a prompt",
                "Refusing to replace the order store without confirmation"
            ));
        }
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Replace {} with {}? The current store is overwritten.",
                store.path().display(),
                args.name
            ))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    store
        .backups()
        .restore(&args.name, store.path())
        .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!(
            "{} Restored {} into {}",
            style("✓").green(),
            style(&args.name).cyan(),
            style(store.path().display()).dim()
        );
    }
    Ok(())
}
