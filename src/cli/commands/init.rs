//! `creq init` command - Initialize a new creq project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::core::config::DEFAULT_REFERENCE_PATH;
use crate::core::project::{Project, ProjectError};
use crate::core::Git;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Also initialize a git repository
    #[arg(long)]
    pub git: bool,

    /// Force initialization even if .creq/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    if args.git {
        init_git(&path)?;
    }

    let project = if args.force {
        Project::init_force(&path)
    } else {
        Project::init(&path)
    };

    match project {
        Ok(project) => {
            println!(
                "{} Initialized creq project at {}",
                style("✓").green(),
                style(project.root().display()).cyan()
            );
            println!();
            println!("Created project structure:");
            print_structure(project.root());
            println!();
            println!("Next steps:");
            println!(
                "  {} Place the reference spreadsheet at {}",
                style("1.").dim(),
                style(DEFAULT_REFERENCE_PATH).cyan()
            );
            println!(
                "  {} Browse clients and racks",
                style("creq ref clients").yellow()
            );
            println!(
                "  {} Record an order",
                style("creq order new").yellow()
            );
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} creq project already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to reinitialize",
                style("creq init --force").yellow()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}

fn init_git(path: &Path) -> Result<()> {
    if Git::new(path).is_repo() {
        println!("{} Git repository already exists", style("✓").green());
        return Ok(());
    }

    Git::init(path).map_err(|e| miette::miette!("Failed to initialize git: {}", e))?;
    println!("{} Initialized git repository", style("✓").green());

    let gitignore_path = path.join(".gitignore");
    if !gitignore_path.exists() {
        std::fs::write(
            &gitignore_path,
            "# Spreadsheet lock files\n~$*.xlsx\n.~lock.*#\n\n# Editor backups\n*.swp\n*~\n",
        )
        .into_diagnostic()?;
    }
    Ok(())
}

fn print_structure(root: &Path) {
    let entries = [".creq/", ".creq/config.yaml", "pedidos/", "pedidos/backup/"];

    for entry in entries {
        if root.join(entry).exists() {
            let prefix = if entry.ends_with('/') { "📁" } else { "📄" };
            println!("  {} {}", prefix, style(entry).dim());
        }
    }
}
