//! wtkit - git worktrees for isolated development sessions
//!
//! wtkit creates a git worktree per branch, copies and links the files a
//! fresh checkout is missing, runs the repository's hooks, and opens a new
//! terminal there running your interactive tool.
//!
//! ## Single-repo sessions
//!
//! Worktrees live under `<data_dir>/worktrees/<project id>/`. Create and
//! delete requests are recorded in a per-project SQLite store and carried
//! out when the requesting session goes idle (see [`session`]).
//!
//! ## Multi-repo sets
//!
//! In a workspace laid out as `main/<repo>` clones, a set puts one worktree
//! per repository side by side in a feature directory (see [`set`]).

pub mod config;
pub mod exec;
pub mod git;
pub mod hooks;
pub mod session;
pub mod set;
pub mod state;
pub mod sync;
pub mod terminal;
pub mod tools;
pub mod validate;
pub mod workspace;

#[cfg(test)]
mod testing;

use terminal::{Terminal, TerminalSpawner};

/// Terminal spawner for the host, honouring `settings.terminal`.
pub fn system_spawner(settings: &config::Settings) -> TerminalSpawner {
    let preferred = settings.terminal.as_deref().and_then(|name| {
        let parsed = Terminal::from_name(name);
        if parsed.is_none() {
            tracing::warn!("Unknown terminal '{}' in settings, detecting instead", name);
        }
        parsed
    });
    TerminalSpawner::system().with_preferred(preferred)
}
