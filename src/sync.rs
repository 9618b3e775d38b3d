//! File sync from a main checkout into a fresh worktree
//!
//! Best effort per item: a bad entry is logged and skipped, the batch
//! always runs to the end.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::validate::is_strictly_inside;

/// What a sync pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub copied: Vec<String>,
    pub linked: Vec<String>,
    pub skipped: Vec<String>,
}

/// Apply `config` from `source_dir` into `target_dir`.
pub async fn sync(config: &SyncConfig, source_dir: &Path, target_dir: &Path) -> SyncReport {
    let excludes = compile_excludes(&config.exclude);
    let (files, mut skipped) = partition_excluded(&config.copy_files, &excludes);
    let (dirs, skipped_dirs) = partition_excluded(&config.symlink_dirs, &excludes);
    skipped.extend(skipped_dirs);

    let mut report = copy_files(source_dir, target_dir, &files).await;
    let linked = symlink_dirs(source_dir, target_dir, &dirs).await;
    report.linked = linked.linked;
    report.skipped.extend(linked.skipped);
    report.skipped.extend(skipped);
    report
}

fn compile_excludes(patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!("Ignoring invalid exclude pattern '{}': {}", p, e);
                None
            }
        })
        .collect()
}

fn partition_excluded(entries: &[String], excludes: &[Pattern]) -> (Vec<String>, Vec<String>) {
    entries.iter().cloned().partition(|entry| {
        let excluded = excludes.iter().any(|p| p.matches(entry));
        if excluded {
            debug!("Excluded from sync: {}", entry);
        }
        !excluded
    })
}

/// Copy each relative file from `source_dir` to the same place in `target_dir`.
///
/// Missing source files are expected (optional `.env.local` and friends)
/// and only logged at debug level.
pub async fn copy_files(source_dir: &Path, target_dir: &Path, files: &[String]) -> SyncReport {
    let mut report = SyncReport::default();

    for file in files {
        if !is_strictly_inside(file, source_dir) || !is_strictly_inside(file, target_dir) {
            warn!("Skipping unsafe copy path: {}", file);
            report.skipped.push(file.clone());
            continue;
        }

        let source = source_dir.join(file);
        let target = target_dir.join(file);

        match copy_one(&source, &target).await {
            Ok(()) => {
                debug!("Copied {}", file);
                report.copied.push(file.clone());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Source file not present, skipping: {}", source.display());
                report.skipped.push(file.clone());
            }
            Err(e) => {
                warn!("Failed to copy {}: {}", file, e);
                report.skipped.push(file.clone());
            }
        }
    }

    report
}

async fn copy_one(source: &Path, target: &Path) -> std::io::Result<()> {
    // stat first so a missing source reports NotFound before any mkdir
    tokio::fs::metadata(source).await?;
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::copy(source, target).await?;
    Ok(())
}

/// Symlink each relative directory of `source_dir` into `target_dir`.
///
/// Any existing target is removed first (worktree checkout can leave an
/// empty placeholder), and the link points at the absolute source path.
pub async fn symlink_dirs(source_dir: &Path, target_dir: &Path, dirs: &[String]) -> SyncReport {
    let mut report = SyncReport::default();

    for dir in dirs {
        if !is_strictly_inside(dir, source_dir) || !is_strictly_inside(dir, target_dir) {
            warn!("Skipping unsafe symlink path: {}", dir);
            report.skipped.push(dir.clone());
            continue;
        }

        let source = absolute(&source_dir.join(dir));
        match tokio::fs::metadata(&source).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                debug!("Not a directory, skipping symlink: {}", source.display());
                report.skipped.push(dir.clone());
                continue;
            }
            Err(_) => {
                debug!("Source directory not present, skipping: {}", source.display());
                report.skipped.push(dir.clone());
                continue;
            }
        }

        let target = target_dir.join(dir);
        match link_one(&source, &target).await {
            Ok(()) => {
                debug!("Linked {} -> {}", target.display(), source.display());
                report.linked.push(dir.clone());
            }
            Err(e) => {
                warn!("Failed to symlink {}: {}", dir, e);
                report.skipped.push(dir.clone());
            }
        }
    }

    report
}

async fn link_one(source: &Path, target: &Path) -> std::io::Result<()> {
    remove_existing(target).await?;
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    make_link(source, target).await
}

#[cfg(unix)]
async fn make_link(source: &Path, target: &Path) -> std::io::Result<()> {
    tokio::fs::symlink(source, target).await
}

#[cfg(windows)]
async fn make_link(source: &Path, target: &Path) -> std::io::Result<()> {
    tokio::fs::symlink_dir(source, target).await
}

async fn remove_existing(target: &Path) -> std::io::Result<()> {
    let meta = match tokio::fs::symlink_metadata(target).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    if meta.is_dir() {
        tokio::fs::remove_dir_all(target).await
    } else {
        tokio::fs::remove_file(target).await
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
