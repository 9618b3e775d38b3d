//! Multi-repo worktree sets
//!
//! A workspace is a directory with a `main/` subdirectory holding the full
//! clones. A set for branch `feature/x` is the sibling directory
//! `feature-x/`, with one worktree per repository, all on `feature/x`.
//!
//! ```text
//! workspace/
//!   main/api/        full clone (.git directory)
//!   main/web/
//!   feature-x/api/   worktree (.git file)
//!   feature-x/web/
//! ```
//!
//! Sets are not persisted anywhere; they are found by scanning.

mod create;
mod list;
mod remove;
mod types;


pub use create::{CreateSet, create_set};
pub use list::list_sets;
pub use remove::remove_set;
pub use types::{RemovalResult, RepoResult, SetInfo, SetResult};

use std::path::{Path, PathBuf};

use crate::git::is_worktree_checkout;

/// Directory holding the full clones
pub const MAIN_DIR: &str = "main";

/// Immediate subdirectories of `dir` that are worktree checkouts, sorted.
pub(crate) async fn worktree_entries(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return found;
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.is_dir() && is_worktree_checkout(&path) {
            found.push(path);
        }
    }

    found.sort();
    found
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
