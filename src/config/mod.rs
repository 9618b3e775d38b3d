//! Configuration loading and management
//!
//! - [`Settings`]: global tool settings in `~/.wtkit/config.toml`
//! - [`WorktreeConfig`]: per-repository sync and hook config (JSONC, read with `json5`)
//! - [`WorkspaceConfig`]: per-workspace repository presets (JSONC)

mod io;
mod preset;
mod worktree;

pub use io::write_atomic;
pub use preset::{WorkspaceConfig, resolve_repos, validate_preset_name};
pub use worktree::{
    CONFIG_DIR, DEFAULT_WORKTREE_CONFIG, HooksConfig, SyncConfig, WorktreeConfig,
};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Global settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Interactive tool launched in every new terminal
    pub command: String,

    /// Flag that resumes a session id, e.g. `opencode --session <id>`
    pub session_flag: String,

    /// Root for per-project state and single-repo worktrees
    pub data_dir: Option<PathBuf>,

    /// Force a terminal by name instead of detecting one
    pub terminal: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            command: "opencode".to_string(),
            session_flag: "--session".to_string(),
            data_dir: None,
            terminal: None,
        }
    }
}

impl Settings {
    /// Data directory, falling back to the platform data dir.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(Self::global_config_dir)
                .join("wtkit")
        })
    }

    /// Apply `WTKIT_COMMAND` / `WTKIT_DATA_DIR` overrides.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(command) = lookup("WTKIT_COMMAND").filter(|v| !v.trim().is_empty()) {
            self.command = command;
        }
        if let Some(dir) = lookup("WTKIT_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// Command line for resuming `session_id` in a new terminal.
    pub fn resume_command(&self, session_id: &str) -> String {
        format!("{} {} {}", self.command, self.session_flag, session_id)
    }
}
