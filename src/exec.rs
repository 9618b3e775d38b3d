//! External process execution
//!
//! Every external tool (git, terminal binaries, shells) is started through
//! this module with an argument vector. Nothing here ever builds a shell
//! string.

use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

/// Captured result of a finished process
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub status_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status_code == Some(0)
    }

    /// First non-empty stderr line, falling back to stdout.
    pub fn error_line(&self) -> String {
        self.stderr
            .lines()
            .chain(self.stdout.lines())
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| match self.status_code {
                Some(code) => format!("exited with status {code}"),
                None => "terminated by signal".to_string(),
            })
    }
}

fn build(program: &str, args: &[String], cwd: Option<&Path>) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    cmd
}

/// Run a process to completion and capture its output.
pub async fn run(program: &str, args: &[String], cwd: Option<&Path>) -> io::Result<CommandOutput> {
    let output = build(program, args, cwd).output().await?;
    Ok(CommandOutput {
        status_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Like [`run`], but gives up after `limit`.
///
/// The child is killed when the deadline passes and the call fails with
/// [`io::ErrorKind::TimedOut`].
pub async fn run_with_timeout(
    program: &str,
    args: &[String],
    cwd: Option<&Path>,
    limit: Duration,
) -> io::Result<CommandOutput> {
    match tokio::time::timeout(limit, run(program, args, cwd)).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("{program} did not finish within {}s", limit.as_secs_f32()),
        )),
    }
}

/// Start a process and release it immediately.
///
/// The child gets null stdio and its own process group, and its handle is
/// dropped without waiting, so its lifetime is entirely outside ours.
pub fn spawn_detached(program: &str, args: &[String], cwd: Option<&Path>) -> io::Result<()> {
    let mut cmd = std::process::Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        cmd.creation_flags(DETACHED_PROCESS);
    }

    let child = cmd.spawn()?;
    tracing::debug!("Detached {} (pid {})", program, child.id());
    drop(child);
    Ok(())
}

/// Check whether `name` resolves on PATH (`which` on unix, `where` on windows).
pub async fn command_exists(name: &str) -> bool {
    let probe = if cfg!(windows) { "where" } else { "which" };
    run(probe, &[name.to_string()], None)
        .await
        .map(|out| out.success())
        .unwrap_or(false)
}

/// Seam between launch logic and the real OS.
///
/// The terminal spawner only talks to processes through this trait so that
/// launch plans can be exercised without opening windows.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion and capture output.
    async fn run(&self, program: &str, args: &[String], cwd: Option<&Path>)
    -> io::Result<CommandOutput>;

    /// Fire-and-forget launch.
    fn spawn_detached(&self, program: &str, args: &[String], cwd: Option<&Path>) -> io::Result<()>;

    /// Capability probe for a binary.
    async fn exists(&self, name: &str) -> bool;
}

/// [`CommandRunner`] backed by real processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
    ) -> io::Result<CommandOutput> {
        run(program, args, cwd).await
    }

    fn spawn_detached(&self, program: &str, args: &[String], cwd: Option<&Path>) -> io::Result<()> {
        spawn_detached(program, args, cwd)
    }

    async fn exists(&self, name: &str) -> bool {
        command_exists(name).await
    }
}

/// Convert a `&[&str]` literal into the owned argument vector `run` takes.
pub fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_line_prefers_stderr() {
        let out = CommandOutput {
            status_code: Some(128),
            stdout: "ignored\n".into(),
            stderr: "\nfatal: not a git repository\nmore\n".into(),
        };
        assert_eq!(out.error_line(), "fatal: not a git repository");
    }

    #[test]
    fn error_line_falls_back_to_status() {
        let out = CommandOutput {
            status_code: Some(3),
            ..Default::default()
        };
        assert_eq!(out.error_line(), "exited with status 3");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_captures_output_and_status() {
        let out = run("sh", &args(&["-c", "echo hi; echo oops >&2; exit 2"]), None)
            .await
            .unwrap();
        assert_eq!(out.stdout.trim(), "hi");
        assert_eq!(out.stderr.trim(), "oops");
        assert_eq!(out.status_code, Some(2));
        assert!(!out.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_with_timeout_reports_timed_out() {
        let err = run_with_timeout("sleep", &args(&["5"]), None, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[tokio::test]
    async fn missing_binary_is_not_found() {
        let err = run("wtkit-definitely-not-a-binary", &[], None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
