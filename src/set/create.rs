use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tracing::{info, warn};

use super::types::{RepoResult, SetResult};
use super::{MAIN_DIR, worktree_entries};
use crate::config::WorktreeConfig;
use crate::git::GitRepo;
use crate::hooks::run_hooks;
use crate::sync::sync;
use crate::terminal::TerminalLauncher;
use crate::validate::{ValidBranch, validate_branch};

/// Parameters for [`create_set`]
#[derive(Debug, Clone)]
pub struct CreateSet<'a> {
    pub workspace_root: &'a Path,
    pub branch: &'a str,
    pub base: Option<&'a str>,
    pub repos: &'a [String],
    pub run_hooks: bool,
}

/// Create one worktree per repo under the branch's feature directory.
///
/// Repos are processed one at a time in the given order; a failing repo is
/// recorded and the rest still run. When at least one worktree exists at
/// the end, `launcher` opens a terminal in the feature directory running
/// `command`. When none does, the feature directory is removed again.
pub async fn create_set(
    request: &CreateSet<'_>,
    launcher: &dyn TerminalLauncher,
    command: &str,
) -> SetResult {
    let branch = match validate_branch(request.branch) {
        Ok(branch) => branch,
        Err(e) => {
            let message = format!("invalid branch name: {e}");
            return SetResult::all_failed(PathBuf::new(), request.repos, &message);
        }
    };

    let feature_path = request.workspace_root.join(branch.dir_name());
    if !worktree_entries(&feature_path).await.is_empty() {
        let message = format!("{} already contains worktrees", feature_path.display());
        return SetResult::all_failed(feature_path, request.repos, &message);
    }

    let created_dir = !feature_path.exists();
    if let Err(e) = tokio::fs::create_dir_all(&feature_path).await {
        let message = format!("failed to create {}: {e}", feature_path.display());
        return SetResult::all_failed(feature_path, request.repos, &message);
    }

    let mut results = Vec::with_capacity(request.repos.len());
    for repo in request.repos {
        let outcome = create_repo_worktree(request, &branch, &feature_path, repo).await;
        match outcome {
            Ok(path) => {
                info!("[{}] worktree ready at {}", repo, path.display());
                results.push(RepoResult::ok(repo, path));
            }
            Err(e) => {
                warn!("[{}] {:#}", repo, e);
                results.push(RepoResult::failed(repo, format!("{e:#}")));
            }
        }
    }

    let mut result = SetResult::new(feature_path, results);

    if result.success_count == 0 {
        if created_dir {
            if let Err(e) = tokio::fs::remove_dir_all(&result.feature_path).await {
                warn!(
                    "Failed to remove {}: {}",
                    result.feature_path.display(),
                    e
                );
            }
        }
        return result;
    }

    // the feature directory is not a repository, so no session to resume
    match launcher
        .launch(&result.feature_path, command, branch.as_str())
        .await
    {
        Ok(()) => result.terminal_launched = true,
        Err(e) => warn!("Could not open a terminal: {}", e),
    }

    result
}

async fn create_repo_worktree(
    request: &CreateSet<'_>,
    branch: &ValidBranch,
    feature_path: &Path,
    repo: &str,
) -> Result<PathBuf> {
    if repo.is_empty() || repo.contains(['/', '\\']) || repo == "." || repo == ".." {
        bail!("invalid repository name '{repo}'");
    }

    let main_path = request.workspace_root.join(MAIN_DIR).join(repo);
    if !main_path.is_dir() {
        bail!("main checkout {} not found", main_path.display());
    }

    let target = feature_path.join(repo);
    GitRepo::new(&main_path)
        .create_worktree(&target, branch, request.base)
        .await?;

    let config = WorktreeConfig::load(&main_path).await;
    sync(&config.sync, &main_path, &target).await;
    if request.run_hooks {
        let report = run_hooks(&target, &config.hooks.post_create).await;
        if !report.all_succeeded() {
            warn!("[{}] {} postCreate hook(s) failed", repo, report.failed.len());
        }
    }

    Ok(target)
}
