//! Platform-adaptive terminal launching
//!
//! Opens a new terminal window, tab, or multiplexer pane in a directory and
//! runs a command in it. Detection picks the surface:
//!
//! 1. tmux / zellij when running inside one
//! 2. WSL, through a Windows-side terminal
//! 3. the platform's own terminals, with fallbacks
//!
//! Commands are always delivered through a temporary script (see [`script`])
//! except for Ghostty on macOS, which takes the command inline.

mod detect;
mod escape;
mod plan;
mod script;
mod spawner;

pub use detect::{Detection, EnvSnapshot, Multiplexer, Platform, Terminal, detect};
pub use escape::{escape_applescript, escape_batch, escape_posix, quote_posix};
pub use plan::{Invocation, LaunchMode};
pub use spawner::TerminalSpawner;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from opening a terminal
#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("working directory {0} does not exist")]
    MissingDirectory(PathBuf),

    #[error("failed to write launch script: {0}")]
    Script(#[source] std::io::Error),

    #[error("{launcher} failed: {reason}")]
    Launch { launcher: String, reason: String },

    #[error("no terminal could be opened (tried: {})", format_tried(.tried))]
    NoTerminal { tried: Vec<String> },
}

fn format_tried(tried: &[String]) -> String {
    if tried.is_empty() {
        "none installed".to_string()
    } else {
        tried.join(", ")
    }
}

/// Anything that can open a terminal running a command
#[async_trait]
pub trait TerminalLauncher: Send + Sync {
    async fn launch(&self, cwd: &Path, command: &str, name: &str) -> Result<(), TerminalError>;
}
