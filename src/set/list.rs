use std::path::Path;

use anyhow::{Context, Result};

use super::types::SetInfo;
use super::{MAIN_DIR, file_name, worktree_entries};

/// Every feature directory in the workspace holding at least one worktree,
/// sorted by name.
pub async fn list_sets(workspace_root: &Path) -> Result<Vec<SetInfo>> {
    let mut entries = tokio::fs::read_dir(workspace_root)
        .await
        .with_context(|| format!("Failed to read {}", workspace_root.display()))?;

    let mut sets = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let name = file_name(&path);
        if name == MAIN_DIR || !path.is_dir() {
            continue;
        }

        let repos: Vec<String> = worktree_entries(&path)
            .await
            .iter()
            .map(|p| file_name(p))
            .collect();
        if repos.is_empty() {
            continue;
        }

        sets.push(SetInfo { name, path, repos });
    }

    sets.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(sets)
}
