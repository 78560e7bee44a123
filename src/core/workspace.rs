//! Wiring of a project's configuration into the order components
//!
//! A [`Workspace`] owns the reference cache for the lifetime of a command
//! and builds the order store with or without a remote mirror.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::core::config::Config;
use crate::core::project::{Project, ProjectError};
use crate::core::reference::{ReferenceCache, ReferenceError};
use crate::core::store::{OrderStore, StorePaths};
use crate::core::sync::{GitMirror, ManagedFile, RemoteSync};
use crate::entities::ReferenceItem;

pub struct Workspace {
    project: Project,
    config: Config,
    references: ReferenceCache,
}

impl Workspace {
    /// Discover the project from `start` (or the current directory) and load its config
    pub fn discover(start: Option<&Path>) -> Result<Self, ProjectError> {
        let project = match start {
            Some(path) => Project::discover_from(path)?,
            None => Project::discover()?,
        };
        let config = Config::load(Some(&project));
        Ok(Self::new(project, config))
    }

    pub fn new(project: Project, config: Config) -> Self {
        let references = ReferenceCache::new(config.reference_sheet());
        Self {
            project,
            config,
            references,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn root(&self) -> &Path {
        self.project.root()
    }

    pub fn reference_path(&self) -> PathBuf {
        self.config.reference_path(self.root())
    }

    /// Reference rows, loaded on first use
    pub fn references(&mut self) -> Result<Arc<Vec<ReferenceItem>>, ReferenceError> {
        let path = self.reference_path();
        self.references.get_or_load(&path)
    }

    pub fn store_paths(&self) -> StorePaths {
        StorePaths {
            store: self.config.store_path(self.root()),
            backup_dir: self.config.backup_dir(self.root()),
            backup_keep: self.config.backup_keep(),
        }
    }

    /// Git mirror of the reference and store files, if a remote is configured
    pub fn remote_sync(&self) -> Option<RemoteSync<GitMirror>> {
        let url = self.config.remote_url.as_deref()?.trim();
        if url.is_empty() {
            return None;
        }

        let mut mirror = GitMirror::new(url, self.config.git_identity())
            .with_branch(self.config.remote_branch())
            .with_subdir(self.config.mirror_subdir())
            .with_file(ManagedFile::new(self.reference_path()))
            .with_file(ManagedFile::new(self.config.store_path(self.root())));

        if self.config.is_hosted() {
            if let Some(token) = self.config.git_token.as_deref() {
                mirror = mirror.with_token(token);
            }
        }

        let workdir = self.config.mirror_dir(self.root());
        debug!(
            remote = %mirror.display_url(),
            workdir = %workdir.display(),
            branch = %self.config.remote_branch(),
            "Mirror sync enabled"
        );
        Some(RemoteSync::new(mirror, workdir))
    }

    /// Order store, mirrored after each save when a remote is configured
    pub fn order_store(&self) -> OrderStore {
        let store = OrderStore::new(self.store_paths());
        match self.remote_sync() {
            Some(sync) => store.with_sync(Box::new(sync)),
            None => store,
        }
    }
}
