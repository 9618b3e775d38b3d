//! Worktree operations for GitRepo

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use super::{GitRepo, path_arg};
use crate::exec;
use crate::validate::ValidBranch;

impl GitRepo {
    /// Create a worktree for `branch` at `path`.
    ///
    /// An existing branch is checked out as is; otherwise the branch is
    /// created from `base` (default `HEAD`). The parent of `path` is
    /// created first.
    pub async fn create_worktree(
        &self,
        path: &Path,
        branch: &ValidBranch,
        base: Option<&str>,
    ) -> Result<()> {
        let base = base.map(str::trim).filter(|b| !b.is_empty());
        if let Some(base) = base {
            if base.starts_with('-') {
                bail!("invalid base ref '{base}'");
            }
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let path_str = path_arg(path)?;
        let output = if self.branch_exists(branch.as_str()).await {
            if let Some(base) = base {
                info!("Branch {} already exists; ignoring base {}", branch, base);
            }
            self.git(&["worktree", "add", path_str, branch.as_str()])
                .await?
        } else {
            self.git(&[
                "worktree",
                "add",
                "-b",
                branch.as_str(),
                path_str,
                base.unwrap_or("HEAD"),
            ])
            .await?
        };

        if !output.success() {
            bail!("Failed to create worktree: {}", output.error_line());
        }

        info!("Created worktree {} on {}", path.display(), branch);
        Ok(())
    }

    /// Force-remove the worktree at `path`.
    ///
    /// Must run against the repository that owns the worktree list.
    pub async fn remove_worktree(&self, path: &Path) -> Result<()> {
        let path_str = path_arg(path)?;
        let output = self
            .git(&["worktree", "remove", "--force", path_str])
            .await?;

        if !output.success() {
            bail!("Failed to remove worktree: {}", output.error_line());
        }

        info!("Removed worktree {}", path.display());
        Ok(())
    }
}

/// Main repository root owning the worktree at `worktree`.
pub async fn main_repo_root(worktree: &Path) -> Result<PathBuf> {
    let output = exec::run(
        "git",
        &exec::args(&["rev-parse", "--path-format=absolute", "--git-common-dir"]),
        Some(worktree),
    )
    .await
    .context("Failed to run git rev-parse")?;

    if !output.success() {
        bail!(
            "Cannot resolve main repository for {}: {}",
            worktree.display(),
            output.error_line()
        );
    }

    let common_dir = PathBuf::from(output.stdout.trim());
    if common_dir.file_name().is_some_and(|n| n == ".git") {
        if let Some(parent) = common_dir.parent() {
            return Ok(parent.to_path_buf());
        }
    }
    // bare repository: the common dir is the repository itself
    Ok(common_dir)
}

/// A worktree checkout has a `.git` *file*; a full clone has a directory.
pub fn is_worktree_checkout(dir: &Path) -> bool {
    std::fs::symlink_metadata(dir.join(".git"))
        .map(|m| m.is_file())
        .unwrap_or(false)
}
