//! Per-repository worktree configuration (`.wtkit/worktree.jsonc`)
//!
//! Loaded fresh on every operation so edits take effect immediately.
//! Loading never fails: a missing file is created with defaults, an
//! unreadable or malformed one falls back to defaults with a warning.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Directory (inside the main checkout) holding wtkit's repo config
pub const CONFIG_DIR: &str = ".wtkit";
/// File name of the per-repository config
pub const CONFIG_FILE: &str = "worktree.jsonc";

/// Written when a repository has no config yet
pub const DEFAULT_WORKTREE_CONFIG: &str = r#"{
  // wtkit worktree configuration
  //
  // Paths are relative to the repository root. Absolute paths and paths
  // containing ".." are ignored.
  "sync": {
    // Files copied from the main checkout into each new worktree
    // (missing files are skipped), e.g. [".env", ".env.local"]
    "copyFiles": [],
    // Directories symlinked from the main checkout instead of duplicated,
    // e.g. ["node_modules"]
    "symlinkDirs": [],
    // Glob patterns excluded from copyFiles and symlinkDirs
    "exclude": []
  },
  "hooks": {
    // Shell commands run (bash -c) inside a new worktree after it is set up
    "postCreate": [],
    // Shell commands run inside a worktree right before it is removed
    "preDelete": []
  }
}
"#;

/// File sync settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    pub copy_files: Vec<String>,
    pub symlink_dirs: Vec<String>,
    pub exclude: Vec<String>,
}

/// Lifecycle hook commands
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HooksConfig {
    pub post_create: Vec<String>,
    pub pre_delete: Vec<String>,
}

/// Everything a repository can customise about its worktrees
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorktreeConfig {
    pub sync: SyncConfig,
    pub hooks: HooksConfig,
}

impl WorktreeConfig {
    /// Location of the config file for a main checkout
    pub fn path_for(repo_root: &Path) -> PathBuf {
        repo_root.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load the config for `repo_root`, creating it with defaults if absent.
    pub async fn load(repo_root: &Path) -> Self {
        let path = Self::path_for(repo_root);

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Self::parse(&content, &path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Err(e) = write_default(&path).await {
                    warn!("Failed to create default config {}: {}", path.display(), e);
                } else {
                    info!("Created default worktree config at {}", path.display());
                }
                Self::default()
            }
            Err(e) => {
                warn!("Failed to read {}: {}; using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    fn parse(content: &str, path: &Path) -> Self {
        match json5::from_str(content) {
            Ok(config) => config,
            Err(e) => {
                warn!("Invalid config {}: {}; using defaults", path.display(), e);
                Self::default()
            }
        }
    }
}

async fn write_default(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, DEFAULT_WORKTREE_CONFIG).await
}
