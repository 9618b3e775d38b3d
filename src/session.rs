//! Single-repo worktree sessions
//!
//! A session is a worktree at `<data_dir>/worktrees/<project id>/<branch>`
//! tied to an interactive session id. Creating or deleting one only records
//! a pending operation; [`SessionManager::on_idle`] carries it out once the
//! interactive session that asked for it has gone idle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{Settings, WorktreeConfig};
use crate::git::GitRepo;
use crate::hooks::run_hooks;
use crate::state::{Pending, PendingKind, Session, StateStore, project_id, state_db_path};
use crate::sync::sync;
use crate::terminal::TerminalLauncher;
use crate::validate::{ValidBranch, validate_branch};

/// What [`SessionManager::on_idle`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdleOutcome {
    Spawned { branch: String, launched: bool },
    Deleted { branch: String, removed: bool },
}

/// Lifecycle of single-repo sessions for one project
pub struct SessionManager {
    repo_root: PathBuf,
    worktrees_dir: PathBuf,
    store: Arc<StateStore>,
    settings: Settings,
    launcher: Arc<dyn TerminalLauncher>,
}

impl SessionManager {
    /// Open the project whose main checkout is `repo_root`.
    pub async fn open(
        repo_root: &Path,
        settings: Settings,
        launcher: Arc<dyn TerminalLauncher>,
    ) -> Result<Self> {
        let id = project_id(repo_root).await;
        let data_dir = settings.data_dir();
        let store = Arc::new(StateStore::open_async(&state_db_path(&data_dir, &id)).await?);
        store.register_shutdown_hook();

        Ok(Self {
            repo_root: repo_root.to_path_buf(),
            worktrees_dir: data_dir.join("worktrees").join(&id),
            store,
            settings,
            launcher,
        })
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Deterministic worktree location for `branch`.
    pub fn worktree_path(&self, branch: &ValidBranch) -> PathBuf {
        self.worktrees_dir.join(branch.dir_name())
    }

    /// Create a worktree for `branch` and queue a terminal for it.
    ///
    /// A new session id is generated when none is given.
    pub async fn create(
        &self,
        branch: &str,
        base: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<Session> {
        let branch = validate_branch(branch).context("Invalid branch name")?;
        let path = self.worktree_path(&branch);

        GitRepo::new(&self.repo_root)
            .create_worktree(&path, &branch, base)
            .await?;

        let config = WorktreeConfig::load(&self.repo_root).await;
        sync(&config.sync, &self.repo_root, &path).await;
        run_hooks(&path, &config.hooks.post_create).await;

        let id = session_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let session = Session::new(id, branch.as_str(), path);
        self.store.add_session(&session)?;
        self.store
            .set_pending(PendingKind::Spawn, &Pending::for_session(&session))?;

        info!(
            "Session {} on {} at {}",
            session.id,
            session.branch,
            session.path.display()
        );
        Ok(session)
    }

    /// Queue removal of the worktree belonging to `session_id`.
    pub fn request_delete(&self, session_id: &str) -> Result<Pending> {
        let session = self
            .store
            .get_session(session_id)?
            .ok_or_else(|| anyhow!("no worktree associated with this session"))?;

        let pending = Pending::for_session(&session);
        self.store.set_pending(PendingKind::Delete, &pending)?;
        Ok(pending)
    }

    /// Run the pending operation, if any, and clear it.
    ///
    /// Failures are logged; the slot is cleared either way and nothing is
    /// retried.
    pub async fn on_idle(&self) -> Result<Option<IdleOutcome>> {
        let Some((kind, pending)) = self.store.peek_pending()? else {
            return Ok(None);
        };

        let outcome = match kind {
            PendingKind::Spawn => {
                let command = match &pending.session_id {
                    Some(id) => self.settings.resume_command(id),
                    None => self.settings.command.clone(),
                };
                let launched = match self
                    .launcher
                    .launch(&pending.path, &command, &pending.branch)
                    .await
                {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Could not open a terminal for {}: {}", pending.branch, e);
                        false
                    }
                };
                IdleOutcome::Spawned {
                    branch: pending.branch.clone(),
                    launched,
                }
            }
            PendingKind::Delete => {
                let removed = match self.delete_worktree(&pending).await {
                    Ok(()) => {
                        self.store.remove_session(&pending.branch)?;
                        true
                    }
                    Err(e) => {
                        warn!("Failed to remove worktree for {}: {:#}", pending.branch, e);
                        false
                    }
                };
                IdleOutcome::Deleted {
                    branch: pending.branch.clone(),
                    removed,
                }
            }
        };

        self.store.clear_pending(kind)?;
        Ok(Some(outcome))
    }

    async fn delete_worktree(&self, pending: &Pending) -> Result<()> {
        if !pending.path.exists() {
            info!("Worktree {} already gone", pending.path.display());
            return Ok(());
        }

        let message = format!("wtkit: snapshot before removing {}", pending.branch);
        match GitRepo::new(&pending.path).snapshot(&message).await {
            Ok(true) => info!("Snapshot committed on {}", pending.branch),
            Ok(false) => {}
            Err(e) => warn!("Snapshot of {} failed: {:#}", pending.branch, e),
        }

        let config = WorktreeConfig::load(&self.repo_root).await;
        run_hooks(&pending.path, &config.hooks.pre_delete).await;

        GitRepo::new(&self.repo_root)
            .remove_worktree(&pending.path)
            .await
    }
}
