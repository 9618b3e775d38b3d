//! Lifecycle hook execution
//!
//! Hooks are user-authored shell commands. Each runs through `bash -c` in
//! the worktree, one after another. A failing hook is logged and the next
//! one still runs.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{info, warn};

/// Outcome of a hook batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookReport {
    pub ran: usize,
    pub failed: Vec<String>,
}

impl HookReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run `commands` sequentially in `cwd`.
///
/// stdout is inherited so the user sees hook output; stderr is captured
/// for the warning logged on failure.
pub async fn run_hooks(cwd: &Path, commands: &[String]) -> HookReport {
    let mut report = HookReport::default();

    for command in commands {
        if command.trim().is_empty() {
            continue;
        }
        info!("Running hook: {}", command);
        report.ran += 1;

        let result = Command::new("bash")
            .arg("-c")
            .arg(command)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => {}
            Ok(output) => {
                warn!(
                    "Hook '{}' failed ({}): {}",
                    command,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                report.failed.push(command.clone());
            }
            Err(e) => {
                warn!("Hook '{}' could not be started: {}", command, e);
                report.failed.push(command.clone());
            }
        }
    }

    report
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn failures_do_not_stop_later_hooks() {
        let tmp = TempDir::new().unwrap();
        let commands = vec![
            "echo one > first.txt".to_string(),
            "echo boom >&2; exit 3".to_string(),
            "echo two > second.txt".to_string(),
        ];

        let report = run_hooks(tmp.path(), &commands).await;

        assert_eq!(report.ran, 3);
        assert_eq!(report.failed, vec!["echo boom >&2; exit 3".to_string()]);
        assert!(tmp.path().join("first.txt").exists());
        assert!(tmp.path().join("second.txt").exists());
    }

    #[tokio::test]
    async fn hooks_run_in_given_directory() {
        let tmp = TempDir::new().unwrap();
        let report = run_hooks(tmp.path(), &["pwd > where.txt".to_string()]).await;
        assert!(report.all_succeeded());

        let recorded = std::fs::read_to_string(tmp.path().join("where.txt")).unwrap();
        let expected = tmp.path().canonicalize().unwrap();
        assert_eq!(
            std::path::Path::new(recorded.trim()).canonicalize().unwrap(),
            expected
        );
    }
}
