//! `creq sync` command - Mirror the spreadsheets to the git remote now

use console::style;
use miette::Result;

use crate::cli::commands::utils::open_workspace;
use crate::cli::GlobalOpts;
use crate::core::{Publish, SyncOutcome};

#[derive(clap::Args, Debug)]
pub struct SyncArgs {}

pub fn run(_args: SyncArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = open_workspace(global)?;

    let Some(sync) = workspace.remote_sync() else {
        if !global.quiet {
            println!(
                "{} No remote configured; set {} in .creq/config.yaml",
                style("!").yellow(),
                style("remote_url").cyan()
            );
        }
        return Ok(());
    };

    if !global.quiet {
        let mirror = sync.backend();
        println!(
            "Syncing {} file(s) to {} as {}",
            mirror.files().len(),
            style(mirror.display_url()).cyan(),
            mirror.identity().name
        );
    }

    match sync.sync_files() {
        SyncOutcome::Synced { publish, attempts } => {
            if !global.quiet {
                let detail = match publish {
                    Publish::Pushed { commit } => {
                        format!("pushed {}", &commit[..commit.len().min(8)])
                    }
                    Publish::UpToDate => "already up to date".to_string(),
                };
                println!(
                    "{} Mirror {} ({} attempt(s))",
                    style("✓").green(),
                    detail,
                    attempts
                );
            }
            Ok(())
        }
        SyncOutcome::Failed { message, .. } => Err(miette::miette!(
            help = "check remote_url, network access and credentials",
            "{}",
            message
        )),
    }
}
