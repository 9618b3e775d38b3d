//! Stable per-project identity

use std::path::{Path, PathBuf};

use crate::git::GitRepo;

/// Identity of the repository at `root`.
///
/// The first root commit when there is git history (stable across clones
/// and moves), otherwise a hash of the absolute path.
pub async fn project_id(root: &Path) -> String {
    match GitRepo::new(root).root_commit().await {
        Some(commit) => commit,
        None => path_hash(root),
    }
}

/// First 16 hex chars of the blake3 hash of the absolute `path`.
pub fn path_hash(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let hash = blake3::hash(absolute.to_string_lossy().as_bytes());
    hash.to_hex()[..16].to_string()
}

/// `<data_dir>/projects/<id>`
pub fn project_dir(data_dir: &Path, id: &str) -> PathBuf {
    data_dir.join("projects").join(id)
}

/// `<data_dir>/projects/<id>/state.db`
pub fn state_db_path(data_dir: &Path, id: &str) -> PathBuf {
    project_dir(data_dir, id).join("state.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_hash_is_stable_and_short() {
        let a = path_hash(Path::new("/work/project"));
        assert_eq!(a.len(), 16);
        assert_eq!(a, path_hash(Path::new("/work/project")));
        assert_ne!(a, path_hash(Path::new("/work/other")));
    }

    #[tokio::test]
    async fn falls_back_to_path_hash_without_git() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert_eq!(project_id(tmp.path()).await, path_hash(tmp.path()));
    }

    #[test]
    fn state_db_layout() {
        let path = state_db_path(Path::new("/data/wtkit"), "abc");
        assert_eq!(path, Path::new("/data/wtkit/projects/abc/state.db"));
    }
}
