//! Git operations and worktree management
//!
//! Every git call goes through [`crate::exec`] with an argument vector.

mod worktree;


pub use worktree::{is_worktree_checkout, main_repo_root};

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};

use crate::exec::{self, CommandOutput};

/// Upper bound for git calls that may hit slow or network filesystems
pub const IDENTITY_TIMEOUT: Duration = Duration::from_secs(5);

/// A repository (main checkout or worktree) that git commands run against
#[derive(Debug, Clone)]
pub struct GitRepo {
    root: PathBuf,
}

impl GitRepo {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run git in the repository root.
    pub(crate) async fn git(&self, args: &[&str]) -> Result<CommandOutput> {
        exec::run("git", &exec::args(args), Some(&self.root))
            .await
            .with_context(|| format!("Failed to run git {}", args.first().unwrap_or(&"")))
    }

    /// Run git and fail on a non-zero exit.
    pub(crate) async fn git_ok(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = self.git(args).await?;
        if !output.success() {
            bail!("git {} failed: {}", args.join(" "), output.error_line());
        }
        Ok(output)
    }

    /// Whether `branch` exists as a local branch.
    pub async fn branch_exists(&self, branch: &str) -> bool {
        let reference = format!("refs/heads/{branch}");
        self.git(&["rev-parse", "--verify", "--quiet", &reference])
            .await
            .map(|o| o.success())
            .unwrap_or(false)
    }

    /// Oldest root commit reachable from HEAD.
    ///
    /// Bounded by [`IDENTITY_TIMEOUT`]; a timeout is treated like any other
    /// failure and yields `None`.
    pub async fn root_commit(&self) -> Option<String> {
        let output = exec::run_with_timeout(
            "git",
            &exec::args(&["rev-list", "--max-parents=0", "HEAD"]),
            Some(&self.root),
            IDENTITY_TIMEOUT,
        )
        .await;

        match output {
            Ok(out) if out.success() => out
                .stdout
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .last()
                .map(str::to_string),
            Ok(out) => {
                tracing::debug!("No root commit in {}: {}", self.root.display(), out.error_line());
                None
            }
            Err(e) => {
                tracing::debug!("Root commit lookup failed in {}: {}", self.root.display(), e);
                None
            }
        }
    }

    /// Commit everything in the working tree, including untracked files.
    ///
    /// Returns `false` without committing when the tree is clean.
    pub async fn snapshot(&self, message: &str) -> Result<bool> {
        let status = self.git_ok(&["status", "--porcelain"]).await?;
        if status.stdout.trim().is_empty() {
            return Ok(false);
        }

        self.git_ok(&["add", "-A"]).await?;
        self.git_ok(&["commit", "--no-verify", "-m", message]).await?;
        Ok(true)
    }
}

pub(crate) fn path_arg(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| anyhow!("Path contains invalid UTF-8: {}", path.display()))
}
