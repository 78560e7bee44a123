//! Git command abstraction layer
//!
//! Provides a safe interface for git operations without exposing shell commands directly.
//! All user input is properly escaped via std::process::Command args.

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Git operations abstraction
pub struct Git {
    repo_root: PathBuf,
}

/// Result of a git command execution
#[derive(Debug)]
pub struct GitOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub code: Option<i32>,
}

/// Author/committer identity passed to `git commit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitIdentity {
    pub name: String,
    pub email: String,
}

/// Errors that can occur during git operations
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Git command failed: {message}")]
    CommandFailed { message: String },

    #[error("Git not installed or not in PATH")]
    GitNotFound,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

fn execute(args: &[&str], dir: Option<&Path>) -> Result<GitOutput, GitError> {
    let mut cmd = Command::new("git");
    cmd.args(args);
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }

    let output = cmd.output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            GitError::GitNotFound
        } else {
            GitError::IoError(e)
        }
    })?;

    Ok(GitOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        code: output.status.code(),
    })
}

fn check(output: GitOutput) -> Result<GitOutput, GitError> {
    if output.success {
        Ok(output)
    } else {
        Err(GitError::CommandFailed {
            message: output.stderr,
        })
    }
}

impl Git {
    /// Create a new Git instance for the repository at the given path
    pub fn new(repo_root: &Path) -> Self {
        Self {
            repo_root: repo_root.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.repo_root
    }

    /// Clone `url` into `dest` and return a handle on the new working tree
    pub fn clone_repo(url: &str, dest: &Path) -> Result<Self, GitError> {
        let dest_str = dest.to_string_lossy();
        debug!(dest = %dest_str, "git clone");
        check(execute(&["clone", "--quiet", url, &dest_str], None)?)?;
        Ok(Self::new(dest))
    }

    /// Initialize a repository at the given path
    pub fn init(path: &Path) -> Result<Self, GitError> {
        let git = Self::new(path);
        check(git.run(&["init"])?)?;
        Ok(git)
    }

    /// Execute a git command and return the output
    fn run(&self, args: &[&str]) -> Result<GitOutput, GitError> {
        debug!(command = %Self::format_command(args), root = %self.repo_root.display(), "git");
        execute(args, Some(&self.repo_root))
    }

    /// Check if we're in a git repository
    pub fn is_repo(&self) -> bool {
        self.run(&["rev-parse", "--git-dir"])
            .map(|o| o.success)
            .unwrap_or(false)
    }

    /// Check if working directory is clean (no tracked or untracked changes)
    pub fn is_clean(&self) -> Result<bool, GitError> {
        Ok(self.uncommitted_files()?.is_empty())
    }

    /// Get list of uncommitted changes
    pub fn uncommitted_files(&self) -> Result<Vec<String>, GitError> {
        let output = check(self.run(&["status", "--porcelain", "--untracked-files=all"])?)?;
        Ok(output
            .stdout
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }

    /// Get git user.name
    pub fn user_name(&self) -> Result<String, GitError> {
        let output = self.run(&["config", "user.name"])?;
        if output.success && !output.stdout.is_empty() {
            Ok(output.stdout)
        } else {
            Err(GitError::CommandFailed {
                message: "git user.name not configured".to_string(),
            })
        }
    }

    /// Get git user.email
    pub fn user_email(&self) -> Result<String, GitError> {
        let output = self.run(&["config", "user.email"])?;
        if output.success && !output.stdout.is_empty() {
            Ok(output.stdout)
        } else {
            Err(GitError::CommandFailed {
                message: "git user.email not configured".to_string(),
            })
        }
    }

    /// Stage multiple files for commit
    pub fn stage_files(&self, paths: &[&Path]) -> Result<(), GitError> {
        if paths.is_empty() {
            return Ok(());
        }

        let path_strings: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect();
        let mut args = vec!["add", "--"];
        args.extend(path_strings.iter().map(String::as_str));

        check(self.run(&args)?)?;
        Ok(())
    }

    /// Commit staged changes as `identity`, returning the new commit hash
    pub fn commit_as(&self, message: &str, identity: &GitIdentity) -> Result<String, GitError> {
        let name = format!("user.name={}", identity.name);
        let email = format!("user.email={}", identity.email);
        check(self.run(&["-c", &name, "-c", &email, "commit", "--quiet", "-m", message])?)?;
        self.head()
    }

    /// Hash of HEAD
    pub fn head(&self) -> Result<String, GitError> {
        Ok(check(self.run(&["rev-parse", "HEAD"])?)?.stdout)
    }

    /// Push the current HEAD to `branch` on origin
    pub fn push_head(&self, branch: &str) -> Result<(), GitError> {
        let refspec = format!("HEAD:refs/heads/{}", branch);
        check(self.run(&["push", "--quiet", "origin", &refspec])?)?;
        Ok(())
    }

    /// Format a command for display (dry-run output)
    pub fn format_command(args: &[&str]) -> String {
        format!("git {}", args.join(" "))
    }
}
