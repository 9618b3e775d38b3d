use std::path::PathBuf;

/// Outcome for one repository of a set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoResult {
    pub repo: String,
    pub success: bool,
    /// Worktree path, when it was created
    pub path: Option<PathBuf>,
    pub error: Option<String>,
}

impl RepoResult {
    pub fn ok(repo: &str, path: PathBuf) -> Self {
        Self {
            repo: repo.to_string(),
            success: true,
            path: Some(path),
            error: None,
        }
    }

    pub fn failed(repo: &str, error: impl Into<String>) -> Self {
        Self {
            repo: repo.to_string(),
            success: false,
            path: None,
            error: Some(error.into()),
        }
    }
}

/// Aggregate outcome of creating a set
#[derive(Debug, Clone)]
pub struct SetResult {
    /// Feature directory; empty when the branch name was rejected
    pub feature_path: PathBuf,
    pub results: Vec<RepoResult>,
    pub success_count: usize,
    pub failure_count: usize,
    pub terminal_launched: bool,
}

impl SetResult {
    pub(crate) fn new(feature_path: PathBuf, results: Vec<RepoResult>) -> Self {
        let success_count = results.iter().filter(|r| r.success).count();
        let failure_count = results.len() - success_count;
        Self {
            feature_path,
            results,
            success_count,
            failure_count,
            terminal_launched: false,
        }
    }

    /// Every repo failed with the same `error`.
    pub(crate) fn all_failed(feature_path: PathBuf, repos: &[String], error: &str) -> Self {
        let results = repos.iter().map(|r| RepoResult::failed(r, error)).collect();
        Self::new(feature_path, results)
    }

    pub fn all_succeeded(&self) -> bool {
        self.failure_count == 0
    }
}

/// Outcome of removing a set
#[derive(Debug, Clone)]
pub struct RemovalResult {
    pub feature_path: PathBuf,
    pub removed_count: usize,
    pub errors: Vec<String>,
    pub directory_removed: bool,
}

/// A feature directory holding at least one worktree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetInfo {
    pub name: String,
    pub path: PathBuf,
    pub repos: Vec<String>,
}
