//! Shared test utilities for worktree integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use wtkit::terminal::{TerminalError, TerminalLauncher};

/// Run git in `dir` and return trimmed stdout
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Initialise a repository at `path` with one commit on `main`
pub fn init_repo(path: &Path) {
    fs::create_dir_all(path).expect("Failed to create repo dir");
    git(path, &["init"]);
    git(path, &["config", "user.email", "test@test.com"]);
    git(path, &["config", "user.name", "Test User"]);

    fs::write(path.join("test.txt"), "initial content\n").expect("Failed to write initial file");
    git(path, &["add", "."]);
    git(path, &["commit", "-m", "Initial commit"]);
    git(path, &["branch", "-M", "main"]);
}

/// Creates a temporary git repository for testing
pub fn create_test_repo() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    init_repo(temp_dir.path());
    temp_dir
}

/// Creates a workspace with `main/<repo>` clones for each name
pub fn create_workspace(repos: &[&str]) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    for repo in repos {
        init_repo(&temp_dir.path().join("main").join(repo));
    }
    temp_dir
}

/// Launcher that records what would have been opened
#[derive(Default)]
pub struct RecordingLauncher {
    pub fail: bool,
    calls: Mutex<Vec<(PathBuf, String, String)>>,
}

impl RecordingLauncher {
    pub fn calls(&self) -> Vec<(PathBuf, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TerminalLauncher for RecordingLauncher {
    async fn launch(&self, cwd: &Path, command: &str, name: &str) -> Result<(), TerminalError> {
        self.calls
            .lock()
            .unwrap()
            .push((cwd.to_path_buf(), command.to_string(), name.to_string()));
        if self.fail {
            return Err(TerminalError::NoTerminal { tried: Vec::new() });
        }
        Ok(())
    }
}
