//! Shared helpers for unit tests

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::terminal::{TerminalError, TerminalLauncher};

/// Run git in `dir`, panicking on failure. Returns trimmed stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap_or_else(|e| panic!("failed to run git {:?}: {}", args, e));
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Initialise a repository at `path` with one commit on `main`.
pub fn init_repo(path: &Path) {
    fs::create_dir_all(path).expect("create repo dir");
    git(path, &["init"]);
    git(path, &["config", "user.email", "test@example.com"]);
    git(path, &["config", "user.name", "Test User"]);
    fs::write(path.join("README.md"), "hello\n").expect("write README");
    git(path, &["add", "README.md"]);
    git(path, &["commit", "-m", "init"]);
    git(path, &["branch", "-M", "main"]);
}

/// [`TerminalLauncher`] that records calls instead of opening anything
#[derive(Default)]
pub struct RecordingLauncher {
    pub fail: bool,
    calls: Mutex<Vec<(PathBuf, String, String)>>,
}

impl RecordingLauncher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// `(cwd, command, name)` per launch
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
            Err(TerminalError::NoTerminal { tried: Vec::new() })
        } else {
            Ok(())
        }
    }
}
