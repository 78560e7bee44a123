//! Configuration management with layered hierarchy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::git::{Git, GitIdentity};
use crate::core::Project;

/// Default location of the reference spreadsheet, relative to the project
pub const DEFAULT_REFERENCE_PATH: &str = "pedidos/Mapeamento de Racks - Cabos.xlsx";
pub const DEFAULT_STORE_PATH: &str = "pedidos/pedidos.xlsx";
pub const DEFAULT_BACKUP_DIR: &str = "pedidos/backup";
pub const DEFAULT_MIRROR_DIR: &str = ".creq/mirror";
pub const DEFAULT_MIRROR_SUBDIR: &str = "pedidos";
pub const DEFAULT_BRANCH: &str = "main";

const BOT_NAME: &str = "creq-bot";
const BOT_EMAIL: &str = "creq-bot@users.noreply.github.com";

/// Every key accepted in `config.yaml`
pub const CONFIG_KEYS: &[(&str, &str)] = &[
    ("author", "Default requester / responsible name"),
    ("email", "Email used for mirror commits"),
    ("reference_path", "Reference spreadsheet (env: CREQ_REFERENCE_PATH)"),
    ("reference_sheet", "Sheet holding the reference rows (default: Project)"),
    ("store_path", "Order store spreadsheet"),
    ("backup_dir", "Directory for store backups"),
    ("backup_keep", "Number of backups kept (default: 10)"),
    ("remote_url", "Git remote mirroring the spreadsheets (sync off when unset)"),
    ("remote_branch", "Branch pushed on the remote (default: main)"),
    ("mirror_dir", "Scratch clone used during sync"),
    ("mirror_subdir", "Directory inside the remote receiving the files"),
    ("hosted", "Hosted execution: token auth and bot identity (env: CREQ_HOSTED)"),
];

/// creq configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_sheet: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_keep: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_branch: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror_subdir: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosted: Option<bool>,

    /// Access token for hosted sync; only ever read from the environment
    #[serde(skip)]
    pub git_token: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(project: Option<&Project>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (resolved lazily by the accessors)

        // 2. Global user config (~/.config/creq/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Project config (.creq/config.yaml)
        if let Some(project) = project {
            if let Some(project_config) = Self::read_file(&project.config_path()) {
                config.merge(project_config);
            }
        }

        // 4. Environment variables
        config.apply_env(|key| std::env::var(key).ok());

        config
    }

    /// Parse a config file, ignoring missing or malformed files
    pub fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        let blank = contents
            .lines()
            .all(|l| l.trim().is_empty() || l.trim_start().starts_with('#'));
        if blank {
            return Some(Config::default());
        }
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed config file");
                None
            }
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "creq")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Apply `CREQ_*` environment overrides through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(author) = non_empty("CREQ_AUTHOR") {
            self.author = Some(author);
        }
        if let Some(path) = non_empty("CREQ_REFERENCE_PATH") {
            self.reference_path = Some(PathBuf::from(path));
        }
        if let Some(flag) = non_empty("CREQ_HOSTED") {
            self.hosted = Some(matches!(
                flag.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ));
        }
        if let Some(token) = non_empty("CREQ_GIT_TOKEN") {
            self.git_token = Some(token);
        }
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field;
                })*
            };
        }
        take!(
            author,
            email,
            reference_path,
            reference_sheet,
            store_path,
            backup_dir,
            backup_keep,
            remote_url,
            remote_branch,
            mirror_dir,
            mirror_subdir,
            hosted,
            git_token
        );
    }

    fn resolve(root: &Path, configured: &Option<PathBuf>, default: &str) -> PathBuf {
        let path = configured
            .clone()
            .unwrap_or_else(|| PathBuf::from(default));
        if path.is_absolute() {
            path
        } else {
            root.join(path)
        }
    }

    pub fn reference_path(&self, root: &Path) -> PathBuf {
        Self::resolve(root, &self.reference_path, DEFAULT_REFERENCE_PATH)
    }

    pub fn reference_sheet(&self) -> String {
        self.reference_sheet
            .clone()
            .unwrap_or_else(|| crate::core::reference::REFERENCE_SHEET.to_string())
    }

    pub fn store_path(&self, root: &Path) -> PathBuf {
        Self::resolve(root, &self.store_path, DEFAULT_STORE_PATH)
    }

    pub fn backup_dir(&self, root: &Path) -> PathBuf {
        Self::resolve(root, &self.backup_dir, DEFAULT_BACKUP_DIR)
    }

    pub fn backup_keep(&self) -> usize {
        self.backup_keep
            .unwrap_or(crate::core::backup::DEFAULT_KEEP)
    }

    pub fn mirror_dir(&self, root: &Path) -> PathBuf {
        Self::resolve(root, &self.mirror_dir, DEFAULT_MIRROR_DIR)
    }

    pub fn mirror_subdir(&self) -> String {
        self.mirror_subdir
            .clone()
            .unwrap_or_else(|| DEFAULT_MIRROR_SUBDIR.to_string())
    }

    pub fn remote_branch(&self) -> String {
        self.remote_branch
            .clone()
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string())
    }

    pub fn is_hosted(&self) -> bool {
        self.hosted.unwrap_or(false)
    }

    /// Get the author name, falling back to git config or username
    pub fn author(&self) -> String {
        self.author_with(&Git::new(Path::new(".")))
    }

    /// Author, consulting `git`'s `user.name` before the login name
    pub fn author_with(&self, git: &Git) -> String {
        if let Some(ref author) = self.author {
            return author.clone();
        }

        if let Ok(name) = git.user_name() {
            return name;
        }

        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    /// Identity used for mirror commits
    ///
    /// Hosted runs always commit as the bot; local runs use the author.
    pub fn git_identity(&self) -> GitIdentity {
        self.git_identity_with(&Git::new(Path::new(".")))
    }

    pub fn git_identity_with(&self, git: &Git) -> GitIdentity {
        if self.is_hosted() {
            return GitIdentity {
                name: BOT_NAME.to_string(),
                email: BOT_EMAIL.to_string(),
            };
        }

        let name = self.author_with(git);
        let email = self
            .email
            .clone()
            .or_else(|| git.user_email().ok())
            .unwrap_or_else(|| {
                format!(
                    "{}@localhost",
                    name.to_lowercase().split_whitespace().collect::<Vec<_>>().join(".")
                )
            });
        GitIdentity { name, email }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_resolve_against_root() {
        let config = Config::default();
        let root = Path::new("/srv/orders");
        assert_eq!(config.store_path(root), root.join("pedidos/pedidos.xlsx"));
        assert_eq!(config.backup_dir(root), root.join("pedidos/backup"));
        assert_eq!(config.mirror_dir(root), root.join(".creq/mirror"));
        assert_eq!(config.backup_keep(), 10);
        assert_eq!(config.remote_branch(), "main");
        assert_eq!(config.reference_sheet(), "Project");
        assert!(!config.is_hosted());
    }

    #[test]
    fn test_absolute_paths_are_kept() {
        let config = Config {
            reference_path: Some(PathBuf::from("/data/ref.xlsx")),
            ..Default::default()
        };
        assert_eq!(
            config.reference_path(Path::new("/srv")),
            PathBuf::from("/data/ref.xlsx")
        );
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config {
            reference_path: Some(PathBuf::from("file.xlsx")),
            ..Default::default()
        };
        config.apply_env(env(&[
            ("CREQ_REFERENCE_PATH", "/mnt/share/ref.xlsx"),
            ("CREQ_HOSTED", "1"),
            ("CREQ_GIT_TOKEN", "tok"),
            ("CREQ_AUTHOR", ""),
        ]));

        assert_eq!(config.reference_path, Some(PathBuf::from("/mnt/share/ref.xlsx")));
        assert!(config.is_hosted());
        assert_eq!(config.git_token.as_deref(), Some("tok"));
        assert_eq!(config.author, None);
    }

    #[test]
    fn test_hosted_flag_false_values() {
        let mut config = Config::default();
        config.apply_env(env(&[("CREQ_HOSTED", "0")]));
        assert_eq!(config.hosted, Some(false));
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base: Config = serde_yml::from_str("author: Ana\nbackup_keep: 5\n").unwrap();
        let project: Config = serde_yml::from_str("backup_keep: 3\nremote_url: /tmp/r.git\n").unwrap();
        base.merge(project);

        assert_eq!(base.author.as_deref(), Some("Ana"));
        assert_eq!(base.backup_keep(), 3);
        assert_eq!(base.remote_url.as_deref(), Some("/tmp/r.git"));
    }

    #[test]
    fn test_hosted_identity_is_bot() {
        let config = Config {
            hosted: Some(true),
            author: Some("Ana".to_string()),
            ..Default::default()
        };
        assert_eq!(config.git_identity().name, "creq-bot");
    }

    #[test]
    fn test_local_identity_uses_author_and_email() {
        let config = Config {
            author: Some("Ana Souza".to_string()),
            email: Some("ana@example.com".to_string()),
            ..Default::default()
        };
        let identity = config.git_identity();
        assert_eq!(identity.name, "Ana Souza");
        assert_eq!(identity.email, "ana@example.com");
    }

    #[test]
    fn test_token_never_serialized() {
        let config = Config {
            git_token: Some("secret".to_string()),
            author: Some("Ana".to_string()),
            ..Default::default()
        };
        let yaml = serde_yml::to_string(&config).unwrap();
        assert!(!yaml.contains("secret"));
        assert!(yaml.contains("author: Ana"));
    }

    fn repo_with_user(name: &str, email: &str) -> (tempfile::TempDir, Git) {
        let tmp = tempfile::tempdir().unwrap();
        let git = Git::init(tmp.path()).unwrap();
        for (key, value) in [("user.name", name), ("user.email", email)] {
            std::process::Command::new("git")
                .args(["config", key, value])
                .current_dir(tmp.path())
                .output()
                .unwrap();
        }
        (tmp, git)
    }

    #[test]
    fn test_author_falls_back_to_git_user() {
        let (_tmp, git) = repo_with_user("Bruno Lima", "bruno@example.com");
        let config = Config::default();
        assert_eq!(config.author_with(&git), "Bruno Lima");

        let identity = config.git_identity_with(&git);
        assert_eq!(identity.name, "Bruno Lima");
        assert_eq!(identity.email, "bruno@example.com");
    }

    #[test]
    fn test_configured_author_wins_over_git_user() {
        let (_tmp, git) = repo_with_user("Bruno Lima", "bruno@example.com");
        let config = Config {
            author: Some("Ana".to_string()),
            ..Default::default()
        };
        let identity = config.git_identity_with(&git);
        assert_eq!(identity.name, "Ana");
        assert_eq!(identity.email, "bruno@example.com");
    }
}
