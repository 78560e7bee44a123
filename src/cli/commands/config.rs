//! `creq config` command - Configuration inspection
//!
//! Configuration is edited by hand in the yaml files; these commands show
//! where they live and what the merged result is.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::CONFIG_KEYS;
use crate::core::project::Project;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Show paths to configuration files
    Path,

    /// List all available configuration keys
    Keys,
}

pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show => run_show(global),
        ConfigCommands::Path => run_path(global),
        ConfigCommands::Keys => run_keys(),
    }
}

fn discover(global: &GlobalOpts) -> Option<Project> {
    match global.project.as_deref() {
        Some(path) => Project::discover_from(path).ok(),
        None => Project::discover().ok(),
    }
}

fn run_show(global: &GlobalOpts) -> Result<()> {
    let project = discover(global);
    let config = Config::load(project.as_ref());

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config).into_diagnostic()?);
            return Ok(());
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&config).into_diagnostic()?);
            return Ok(());
        }
        _ => {}
    }

    println!("{}", style("Effective Configuration").bold().underlined());
    println!();

    let identity = config.git_identity();
    print_config_value("author", Some(&config.author()));
    print_config_value(
        "git identity",
        Some(&format!("{} <{}>", identity.name, identity.email)),
    );

    match &project {
        Some(project) => {
            let root = project.root();
            print_path("reference_path", &config.reference_path(root));
            print_config_value("reference_sheet", Some(&config.reference_sheet()));
            print_path("store_path", &config.store_path(root));
            print_path("backup_dir", &config.backup_dir(root));
            print_config_value("backup_keep", Some(&config.backup_keep().to_string()));
            print_path("mirror_dir", &config.mirror_dir(root));
        }
        None => {
            println!(
                "  {} {}",
                style("(paths)").dim(),
                style("not inside a creq project").dim()
            );
        }
    }

    print_config_value("remote_url", config.remote_url.as_deref().map(redact_url).as_ref());
    print_config_value("remote_branch", Some(&config.remote_branch()));
    print_config_value("mirror_subdir", Some(&config.mirror_subdir()));
    print_config_value("hosted", Some(&config.is_hosted().to_string()));
    let token = if config.git_token.is_some() { "set" } else { "not set" };
    print_config_value("git token", Some(&token.to_string()));

    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!("  1. Environment variables (CREQ_AUTHOR, CREQ_REFERENCE_PATH, CREQ_HOSTED, CREQ_GIT_TOKEN)");
    println!("  2. Project config (.creq/config.yaml)");
    println!("  3. Global config (~/.config/creq/config.yaml)");

    Ok(())
}

fn print_config_value(key: &str, value: Option<&String>) {
    match value {
        Some(v) => println!("  {}: {}", style(key).cyan(), v),
        None => println!("  {}: {}", style(key).cyan(), style("(not set)").dim()),
    }
}

fn print_path(key: &str, path: &Path) {
    let marker = if path.exists() {
        style("").dim()
    } else {
        style(" (missing)").yellow()
    };
    println!("  {}: {}{}", style(key).cyan(), path.display(), marker);
}

/// Hide credentials embedded in a remote URL
fn redact_url(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => match rest.split_once('@') {
            Some((_, host)) => format!("{}://***@{}", scheme, host),
            None => url.to_string(),
        },
        None => url.to_string(),
    }
}

fn run_path(global: &GlobalOpts) -> Result<()> {
    match Config::global_config_path() {
        Some(path) => {
            let exists = if path.exists() { "" } else { " (not created)" };
            println!(
                "{}: {}{}",
                style("Global").bold(),
                path.display(),
                style(exists).dim()
            );
        }
        None => println!("{}: {}", style("Global").bold(), style("unavailable").dim()),
    }

    match discover(global) {
        Some(project) => println!(
            "{}: {}",
            style("Project").bold(),
            project.config_path().display()
        ),
        None => println!(
            "{}: {}",
            style("Project").bold(),
            style("not in a creq project").dim()
        ),
    }

    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available Configuration Keys").bold().underlined());
    println!();
    for (key, description) in CONFIG_KEYS {
        println!("  {:<16} {}", style(key).cyan(), description);
    }
    Ok(())
}
