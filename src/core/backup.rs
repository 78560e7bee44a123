//! Timestamped backups of the order store
//!
//! Before every write the live store is copied to
//! `<dir>/pedidos_backup_<YYYYMMDD_HHMMSS>.xlsx`; only the newest `keep`
//! snapshots survive. File names sort in creation order, so rotation is a
//! plain lexicographic sort.

use chrono::{Local, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Number of snapshots kept by default
pub const DEFAULT_KEEP: usize = 10;

const BACKUP_PREFIX: &str = "pedidos_backup_";
const BACKUP_STAMP: &str = "%Y%m%d_%H%M%S";

/// Errors from backup operations
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("cannot back up {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot prune backup {path}: {source}")]
    Prune {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("backup not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of one rotation
#[derive(Debug, Default)]
pub struct Rotation {
    /// Snapshot written, `None` when there was no store to copy
    pub created: Option<PathBuf>,
    /// Old snapshots deleted to stay within the limit
    pub removed: Vec<PathBuf>,
}

/// A backup snapshot on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub name: String,
    pub path: PathBuf,
    /// Parsed from the file name; `None` for foreign `.xlsx` files
    pub taken_at: Option<NaiveDateTime>,
}

/// Copies the store aside and enforces the retention limit
#[derive(Debug, Clone)]
pub struct BackupRotator {
    dir: PathBuf,
    keep: usize,
}

impl BackupRotator {
    pub fn new(dir: impl Into<PathBuf>, keep: usize) -> Self {
        Self {
            dir: dir.into(),
            keep,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name of a snapshot taken at `ts`
    pub fn backup_name(ts: &NaiveDateTime) -> String {
        format!("{}{}.xlsx", BACKUP_PREFIX, ts.format(BACKUP_STAMP))
    }

    /// Snapshot the store now, then prune
    pub fn rotate(&self, store_path: &Path) -> Result<Rotation, BackupError> {
        self.rotate_at(store_path, Local::now().naive_local())
    }

    /// Snapshot the store under the given timestamp, then prune
    pub fn rotate_at(&self, store_path: &Path, ts: NaiveDateTime) -> Result<Rotation, BackupError> {
        fs::create_dir_all(&self.dir)?;

        let mut rotation = Rotation::default();
        if store_path.exists() {
            let target = self.dir.join(Self::backup_name(&ts));
            fs::copy(store_path, &target).map_err(|source| BackupError::Copy {
                path: store_path.to_path_buf(),
                source,
            })?;
            info!(backup = %target.display(), "Backed up order store");
            rotation.created = Some(target);
        }

        rotation.removed = self.prune()?;
        Ok(rotation)
    }

    /// Delete the oldest `.xlsx` files until at most `keep` remain
    pub fn prune(&self) -> Result<Vec<PathBuf>, BackupError> {
        let mut files = self.xlsx_files()?;
        files.sort();

        let excess = files.len().saturating_sub(self.keep);
        let mut removed = Vec::with_capacity(excess);
        for path in files.into_iter().take(excess) {
            fs::remove_file(&path).map_err(|source| BackupError::Prune {
                path: path.clone(),
                source,
            })?;
            debug!(backup = %path.display(), "Removed old backup");
            removed.push(path);
        }

        Ok(removed)
    }

    /// Snapshots on disk, newest first
    pub fn list(&self) -> Result<Vec<BackupEntry>, BackupError> {
        let mut files = self.xlsx_files()?;
        files.sort();
        files.reverse();

        Ok(files
            .into_iter()
            .map(|path| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                let taken_at = name
                    .strip_prefix(BACKUP_PREFIX)
                    .and_then(|rest| rest.strip_suffix(".xlsx"))
                    .and_then(|stamp| NaiveDateTime::parse_from_str(stamp, BACKUP_STAMP).ok());
                BackupEntry {
                    name,
                    path,
                    taken_at,
                }
            })
            .collect())
    }

    /// Replace the live store with a snapshot
    ///
    /// The snapshot is moved into place, so it leaves the backup directory.
    pub fn restore(&self, name: &str, store_path: &Path) -> Result<PathBuf, BackupError> {
        let entry = self
            .list()?
            .into_iter()
            .find(|e| e.name == name)
            .ok_or_else(|| BackupError::NotFound(name.to_string()))?;

        if let Some(parent) = store_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::rename(&entry.path, store_path)?;
        info!(backup = %entry.name, store = %store_path.display(), "Restored backup");
        Ok(entry.path)
    }

    fn xlsx_files(&self) -> Result<Vec<PathBuf>, BackupError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        Ok(walkdir::WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "xlsx"))
            .map(|e| e.path().to_path_buf())
            .collect())
    }
}
