//! Plugin tool surface
//!
//! Every tool returns a human-readable status string and never fails;
//! errors are rendered as `Error: ...`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::Settings;
use crate::git::main_repo_root;
use crate::session::{IdleOutcome, SessionManager};
use crate::set::{self, CreateSet, RemovalResult, SetInfo, SetResult};
use crate::terminal::TerminalLauncher;
use crate::workspace;

/// Context shared by all tools
pub struct Tools {
    cwd: PathBuf,
    settings: Settings,
    launcher: Arc<dyn TerminalLauncher>,
}

fn render(result: Result<String>) -> String {
    result.unwrap_or_else(|e| format!("Error: {e:#}"))
}

impl Tools {
    pub fn new(
        cwd: impl Into<PathBuf>,
        settings: Settings,
        launcher: Arc<dyn TerminalLauncher>,
    ) -> Self {
        Self {
            cwd: cwd.into(),
            settings,
            launcher,
        }
    }

    async fn sessions(&self) -> Result<SessionManager> {
        let root = main_repo_root(&self.cwd).await?;
        SessionManager::open(&root, self.settings.clone(), self.launcher.clone()).await
    }

    pub async fn worktree_create(
        &self,
        branch: &str,
        base: Option<&str>,
        session_id: Option<&str>,
    ) -> String {
        render(self.try_create(branch, base, session_id).await)
    }

    pub async fn worktree_delete(&self, session_id: &str, reason: &str) -> String {
        render(self.try_delete(session_id, reason).await)
    }

    pub async fn session_idle(&self) -> String {
        render(self.try_idle().await)
    }

    pub async fn worktree_set_create(
        &self,
        branch: &str,
        repos: &[String],
        base: Option<&str>,
        preset: Option<&str>,
        workspace: Option<&Path>,
    ) -> String {
        render(self.try_set_create(branch, repos, base, preset, workspace).await)
    }

    pub async fn worktree_set_delete(&self, branch: &str, workspace: Option<&Path>) -> String {
        render(self.try_set_delete(branch, workspace).await)
    }

    pub async fn worktree_set_list(&self, workspace: Option<&Path>) -> String {
        render(self.try_set_list(workspace).await)
    }

    async fn try_create(
        &self,
        branch: &str,
        base: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<String> {
        let session = self
            .sessions()
            .await?
            .create(branch, base, session_id)
            .await?;
        Ok(format!(
            "Worktree for {} created at {}. A terminal opens when this session goes idle.",
            session.branch,
            session.path.display()
        ))
    }

    async fn try_delete(&self, session_id: &str, reason: &str) -> Result<String> {
        let pending = self.sessions().await?.request_delete(session_id)?;
        info!("Delete requested for {}: {}", pending.branch, reason);
        Ok(format!(
            "Worktree {} will be removed when this session goes idle. Uncommitted changes are committed first.",
            pending.path.display()
        ))
    }

    async fn try_idle(&self) -> Result<String> {
        let outcome = self.sessions().await?.on_idle().await?;
        let text = match outcome {
            None => "Nothing pending.".to_string(),
            Some(IdleOutcome::Spawned {
                branch,
                launched: true,
            }) => format!("Opened a terminal for {branch}."),
            Some(IdleOutcome::Spawned {
                branch,
                launched: false,
            }) => format!("Could not open a terminal for {branch}."),
            Some(IdleOutcome::Deleted {
                branch,
                removed: true,
            }) => format!("Removed worktree for {branch}."),
            Some(IdleOutcome::Deleted {
                branch,
                removed: false,
            }) => format!("Failed to remove worktree for {branch}."),
        };
        Ok(text)
    }

    async fn try_set_create(
        &self,
        branch: &str,
        repos: &[String],
        base: Option<&str>,
        preset: Option<&str>,
        workspace: Option<&Path>,
    ) -> Result<String> {
        let root = workspace::resolve(workspace, &self.cwd)?;
        let repos = workspace::select_repos(&root, preset, repos)?;
        let request = CreateSet {
            workspace_root: &root,
            branch,
            base,
            repos: &repos,
            run_hooks: true,
        };
        let result =
            set::create_set(&request, self.launcher.as_ref(), &self.settings.command).await;
        Ok(describe_set(&result))
    }

    async fn try_set_delete(&self, branch: &str, workspace: Option<&Path>) -> Result<String> {
        let root = workspace::resolve(workspace, &self.cwd)?;
        let result = set::remove_set(&root, branch, true).await?;
        Ok(describe_removal(&result))
    }

    async fn try_set_list(&self, workspace: Option<&Path>) -> Result<String> {
        let root = workspace::resolve(workspace, &self.cwd)?;
        Ok(describe_sets(&set::list_sets(&root).await?))
    }
}

/// One line per repo plus a summary.
pub fn describe_set(result: &SetResult) -> String {
    let mut out = String::new();
    for repo in &result.results {
        match (&repo.path, &repo.error) {
            (Some(path), _) if repo.success => {
                let _ = writeln!(out, "  ok   {} -> {}", repo.repo, path.display());
            }
            (_, error) => {
                let _ = writeln!(
                    out,
                    "  fail {}: {}",
                    repo.repo,
                    error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }
    let _ = write!(
        out,
        "{} succeeded, {} failed",
        result.success_count, result.failure_count
    );
    if result.success_count > 0 {
        let _ = write!(out, " in {}", result.feature_path.display());
    }
    out
}

pub fn describe_removal(result: &RemovalResult) -> String {
    let mut out = format!(
        "Removed {} worktree(s) from {}",
        result.removed_count,
        result.feature_path.display()
    );
    for error in &result.errors {
        let _ = write!(out, "\n  warning: {error}");
    }
    if !result.directory_removed {
        out.push_str("\n  warning: feature directory could not be deleted");
    }
    out
}

pub fn describe_sets(sets: &[SetInfo]) -> String {
    if sets.is_empty() {
        return "No worktree sets.".to_string();
    }
    sets.iter()
        .map(|s| format!("{} ({})", s.name, s.repos.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}
