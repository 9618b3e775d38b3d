use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use super::types::RemovalResult;
use super::{file_name, worktree_entries};
use crate::config::WorktreeConfig;
use crate::git::{GitRepo, main_repo_root};
use crate::hooks::run_hooks;
use crate::validate::validate_branch;

/// Remove every worktree of the set for `branch`, then its directory.
///
/// Each worktree is removed through the repository that owns it, after its
/// preDelete hooks. Failures are collected and the loop continues. The
/// feature directory is deleted at the end no matter what.
pub async fn remove_set(workspace_root: &Path, branch: &str, hooks: bool) -> Result<RemovalResult> {
    let branch = validate_branch(branch).context("Invalid branch name")?;
    let feature_path = workspace_root.join(branch.dir_name());

    let meta = tokio::fs::metadata(&feature_path)
        .await
        .with_context(|| format!("Set {} not found", feature_path.display()))?;
    if !meta.is_dir() {
        bail!("{} is not a directory", feature_path.display());
    }

    let mut result = RemovalResult {
        feature_path: feature_path.clone(),
        removed_count: 0,
        errors: Vec::new(),
        directory_removed: false,
    };

    for worktree in worktree_entries(&feature_path).await {
        let repo = file_name(&worktree);
        match remove_worktree(&worktree, hooks).await {
            Ok(()) => {
                info!("[{}] worktree removed", repo);
                result.removed_count += 1;
            }
            Err(e) => {
                warn!("[{}] {:#}", repo, e);
                result.errors.push(format!("{repo}: {e:#}"));
            }
        }
    }

    match tokio::fs::remove_dir_all(&feature_path).await {
        Ok(()) => result.directory_removed = true,
        Err(e) => {
            warn!("Failed to delete {}: {}", feature_path.display(), e);
            result
                .errors
                .push(format!("failed to delete {}: {e}", feature_path.display()));
        }
    }

    Ok(result)
}

async fn remove_worktree(worktree: &Path, hooks: bool) -> Result<()> {
    let main_root = main_repo_root(worktree).await?;

    if hooks {
        let config = WorktreeConfig::load(&main_root).await;
        run_hooks(worktree, &config.hooks.pre_delete).await;
    }

    GitRepo::new(main_root).remove_worktree(worktree).await
}
