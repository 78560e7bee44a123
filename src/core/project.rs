//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::config::{DEFAULT_BACKUP_DIR, DEFAULT_MIRROR_DIR};

/// Name of the marker directory at the project root
pub const MARKER_DIR: &str = ".creq";

/// Represents a creq project
#[derive(Debug, Clone)]
pub struct Project {
    /// Root directory of the project (parent of .creq/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(MARKER_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());

        if root.join(MARKER_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }

        Self::create_structure(root)
    }

    /// Initialize even if .creq/ exists, rewriting the default config
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());
        Self::create_structure(root)
    }

    fn create_structure(root: PathBuf) -> Result<Self, ProjectError> {
        let marker = root.join(MARKER_DIR);
        for dir in [marker.clone(), root.join(DEFAULT_BACKUP_DIR)] {
            std::fs::create_dir_all(&dir).map_err(|e| ProjectError::IoError(e.to_string()))?;
        }

        std::fs::write(marker.join("config.yaml"), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        // The scratch mirror clone never belongs in the project's own history
        let mirror = DEFAULT_MIRROR_DIR
            .strip_prefix(&format!("{}/", MARKER_DIR))
            .unwrap_or(DEFAULT_MIRROR_DIR);
        std::fs::write(marker.join(".gitignore"), format!("{}/\n", mirror))
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# creq project configuration

# Default requester / responsible name (falls back to git user.name)
# author: ""
# email: ""

# Reference spreadsheet with the rack/cable mapping
# reference_path: "pedidos/Mapeamento de Racks - Cabos.xlsx"
# reference_sheet: "Project"

# Order store and its rotating backups
# store_path: "pedidos/pedidos.xlsx"
# backup_dir: "pedidos/backup"
# backup_keep: 10

# Mirror both spreadsheets to a git remote after every new order
# remote_url: "https://github.com/example/orders.git"
# remote_branch: "main"
# mirror_subdir: "pedidos"
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .creq configuration directory
    pub fn creq_dir(&self) -> PathBuf {
        self.root.join(MARKER_DIR)
    }

    /// Project config file
    pub fn config_path(&self) -> PathBuf {
        self.creq_dir().join("config.yaml")
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a creq project (searched from {searched_from:?}). Run 'creq init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("creq project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}
