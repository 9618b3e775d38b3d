//! Workspace discovery for worktree sets

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::config::{WorkspaceConfig, resolve_repos};
use crate::set::MAIN_DIR;

/// Workspace root: `explicit` when given, else the nearest ancestor of
/// `start` (inclusive) that has a `main/` directory.
pub fn resolve(explicit: Option<&Path>, start: &Path) -> Result<PathBuf> {
    if let Some(root) = explicit {
        if !root.join(MAIN_DIR).is_dir() {
            bail!("{} has no {}/ directory", root.display(), MAIN_DIR);
        }
        return Ok(root.to_path_buf());
    }

    discover(start).with_context(|| {
        format!(
            "No workspace found above {} (expected a directory containing {}/)",
            start.display(),
            MAIN_DIR
        )
    })
}

/// Walk up from `start` to the first directory with a `main/` subdirectory.
pub fn discover(start: &Path) -> Option<PathBuf> {
    let start = std::path::absolute(start).unwrap_or_else(|_| start.to_path_buf());
    start
        .ancestors()
        .find(|dir| dir.join(MAIN_DIR).is_dir())
        .map(Path::to_path_buf)
}

/// Repositories available under `main/`, sorted.
pub fn available_repos(root: &Path) -> Result<Vec<String>> {
    let main = root.join(MAIN_DIR);
    let entries =
        std::fs::read_dir(&main).with_context(|| format!("Failed to read {}", main.display()))?;

    let mut repos: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().join(".git").exists())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    repos.sort();
    Ok(repos)
}

/// Repositories for a set: the preset's list merged with `explicit`.
pub fn select_repos(root: &Path, preset: Option<&str>, explicit: &[String]) -> Result<Vec<String>> {
    let presets;
    let from_preset = match preset {
        Some(name) => {
            presets = WorkspaceConfig::load(root);
            Some(
                presets
                    .get(name)
                    .with_context(|| format!("Unknown preset '{name}'"))?,
            )
        }
        None => None,
    };

    let repos = resolve_repos(from_preset, explicit);
    if repos.is_empty() {
        bail!("No repositories selected (use --repos or --preset)");
    }
    Ok(repos)
}
