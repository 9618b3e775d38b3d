//! Executes launch plans through a [`CommandRunner`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::detect::{Detection, EnvSnapshot, Multiplexer, Platform, Terminal, detect};
use super::plan::{self, Invocation, LaunchMode, LaunchTarget};
use super::script::{self, ScriptKind};
use super::{TerminalError, TerminalLauncher};
use crate::exec::{CommandRunner, SystemRunner};

/// Opens a new terminal surface in a directory and runs a command there
pub struct TerminalSpawner {
    runner: Arc<dyn CommandRunner>,
    env: EnvSnapshot,
    preferred: Option<Terminal>,
    script_dir: PathBuf,
}

impl TerminalSpawner {
    pub fn new(runner: Arc<dyn CommandRunner>, env: EnvSnapshot) -> Self {
        Self {
            runner,
            env,
            preferred: None,
            script_dir: std::env::temp_dir(),
        }
    }

    /// Spawner for the real host environment.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemRunner), EnvSnapshot::capture())
    }

    /// Use `terminal` instead of the sniffed one. Multiplexers still win.
    pub fn with_preferred(mut self, terminal: Option<Terminal>) -> Self {
        self.preferred = terminal;
        self
    }

    pub fn with_script_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.script_dir = dir.into();
        self
    }

    /// Open a terminal in `cwd` running `command`, titled `name`.
    pub async fn spawn(&self, cwd: &Path, command: &str, name: &str) -> Result<(), TerminalError> {
        if !cwd.is_dir() {
            return Err(TerminalError::MissingDirectory(cwd.to_path_buf()));
        }
        let cwd = std::path::absolute(cwd).unwrap_or_else(|_| cwd.to_path_buf());
        let cwd_str = cwd.to_string_lossy();

        match detect(&self.env) {
            Detection::Multiplexer(Multiplexer::Tmux) => {
                let script = self.write(ScriptKind::Posix, &cwd_str, command, name)?;
                self.spawn_tmux(&cwd_str, command, name, &script).await
            }
            Detection::Multiplexer(Multiplexer::Zellij) => {
                let script = self.write(ScriptKind::Posix, &cwd_str, command, name)?;
                self.spawn_zellij(&cwd_str, command, name, &script).await
            }
            Detection::Wsl { distro } => {
                let script = self.write(ScriptKind::Posix, &cwd_str, command, name)?;
                self.spawn_wsl(distro.as_deref(), &cwd_str, command, name, &script)
                    .await
            }
            Detection::Native { platform, terminal } => {
                let detected = self.preferred.or(terminal);
                let candidates = self.candidates(platform, detected).await;
                self.spawn_native(platform, &candidates, &cwd_str, command, name)
                    .await
            }
        }
    }

    async fn candidates(&self, platform: Platform, detected: Option<Terminal>) -> Vec<Terminal> {
        let mut list: Vec<Terminal> = Vec::new();
        match platform {
            Platform::MacOS => {
                list.extend(detected);
                list.push(Terminal::AppleTerminal);
            }
            Platform::Windows => {
                if detected == Some(Terminal::WindowsTerminal)
                    || self.runner.exists(Terminal::WindowsTerminal.binary()).await
                {
                    list.push(Terminal::WindowsTerminal);
                }
                list.push(Terminal::Cmd);
            }
            Platform::Linux => list = plan::linux_candidates(detected),
        }
        list.dedup();
        list
    }

    async fn spawn_native(
        &self,
        platform: Platform,
        candidates: &[Terminal],
        cwd: &str,
        command: &str,
        name: &str,
    ) -> Result<(), TerminalError> {
        let kind = if platform == Platform::Windows {
            ScriptKind::Batch
        } else {
            ScriptKind::Posix
        };
        let mut script: Option<String> = None;
        let mut tried = Vec::new();

        for &terminal in candidates {
            // Linux probes every candidate; elsewhere the launchers are system tools
            if platform == Platform::Linux && !self.runner.exists(terminal.binary()).await {
                debug!("{} not installed, skipping", terminal);
                continue;
            }

            let script_path = if plan::needs_script(terminal, platform) {
                match &script {
                    Some(path) => path.clone(),
                    None => {
                        let path = self.write(kind, cwd, command, name)?;
                        script = Some(path.clone());
                        path
                    }
                }
            } else {
                String::new()
            };

            let target = LaunchTarget {
                cwd,
                command,
                name,
                script: &script_path,
            };
            let invocation = plan::terminal_invocation(terminal, platform, &target);

            match self.execute(&invocation, Some(Path::new(cwd))).await {
                Ok(()) => {
                    info!("Opened {} in {}", terminal, cwd);
                    return Ok(());
                }
                Err(reason) => {
                    warn!("{} failed: {}", terminal, reason);
                    tried.push(terminal.to_string());
                }
            }
        }

        Err(TerminalError::NoTerminal { tried })
    }

    async fn spawn_tmux(
        &self,
        cwd: &str,
        command: &str,
        name: &str,
        script: &str,
    ) -> Result<(), TerminalError> {
        let target = LaunchTarget {
            cwd,
            command,
            name,
            script,
        };
        let new_window = plan::tmux_new_window(&target);
        let output = self
            .runner
            .run(&new_window.program, &new_window.args, None)
            .await
            .map_err(|e| launch_error("tmux", e.to_string()))?;
        if !output.success() {
            return Err(launch_error("tmux", output.error_line()));
        }

        let pane = output.stdout.trim();
        if pane.is_empty() {
            return Err(launch_error("tmux", "new-window did not report a pane id"));
        }

        for step in plan::tmux_send(pane, script) {
            self.execute(&step, None)
                .await
                .map_err(|reason| launch_error("tmux", reason))?;
        }

        info!("Opened tmux window {} ({})", name, pane);
        Ok(())
    }

    async fn spawn_zellij(
        &self,
        cwd: &str,
        command: &str,
        name: &str,
        script: &str,
    ) -> Result<(), TerminalError> {
        let target = LaunchTarget {
            cwd,
            command,
            name,
            script,
        };
        for step in plan::zellij_plan(&target) {
            self.execute(&step, None)
                .await
                .map_err(|reason| launch_error("zellij", reason))?;
        }

        info!("Opened zellij tab {}", name);
        Ok(())
    }

    async fn spawn_wsl(
        &self,
        distro: Option<&str>,
        cwd: &str,
        command: &str,
        name: &str,
        script: &str,
    ) -> Result<(), TerminalError> {
        let target = LaunchTarget {
            cwd,
            command,
            name,
            script,
        };
        let windows_terminal = self.runner.exists("wt.exe").await;
        let invocation = plan::wsl_invocation(distro, windows_terminal, &target);

        self.execute(&invocation, None)
            .await
            .map_err(|reason| launch_error(&invocation.program, reason))?;

        info!("Opened WSL terminal via {}", invocation.program);
        Ok(())
    }

    fn write(
        &self,
        kind: ScriptKind,
        cwd: &str,
        command: &str,
        name: &str,
    ) -> Result<String, TerminalError> {
        let content = match kind {
            ScriptKind::Posix => script::posix_script(cwd, command),
            ScriptKind::Batch => script::batch_script(cwd, command, name),
        };
        let path = script::write_script(&self.script_dir, kind, &content)
            .map_err(TerminalError::Script)?;
        debug!("Wrote launch script {}", path.display());
        Ok(path.to_string_lossy().into_owned())
    }

    async fn execute(&self, invocation: &Invocation, cwd: Option<&Path>) -> Result<(), String> {
        match invocation.mode {
            LaunchMode::Wait => {
                let output = self
                    .runner
                    .run(&invocation.program, &invocation.args, cwd)
                    .await
                    .map_err(|e| e.to_string())?;
                if output.success() {
                    Ok(())
                } else {
                    Err(output.error_line())
                }
            }
            LaunchMode::Detach => self
                .runner
                .spawn_detached(&invocation.program, &invocation.args, cwd)
                .map_err(|e| e.to_string()),
        }
    }
}

fn launch_error(launcher: &str, reason: impl Into<String>) -> TerminalError {
    TerminalError::Launch {
        launcher: launcher.to_string(),
        reason: reason.into(),
    }
}

#[async_trait]
impl TerminalLauncher for TerminalSpawner {
    async fn launch(&self, cwd: &Path, command: &str, name: &str) -> Result<(), TerminalError> {
        self.spawn(cwd, command, name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::CommandOutput;
    use std::collections::{HashMap, HashSet};
    use std::io;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq)]
    struct Call {
        program: String,
        args: Vec<String>,
        detached: bool,
    }

    #[derive(Default)]
    struct FakeRunner {
        installed: HashSet<String>,
        failing: HashSet<String>,
        stdout: HashMap<String, String>,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeRunner {
        fn installed(mut self, names: &[&str]) -> Self {
            self.installed.extend(names.iter().map(|s| s.to_string()));
            self
        }

        fn failing(mut self, names: &[&str]) -> Self {
            self.failing.extend(names.iter().map(|s| s.to_string()));
            self
        }

        fn stdout(mut self, program: &str, out: &str) -> Self {
            self.stdout.insert(program.to_string(), out.to_string());
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, program: &str, args: &[String], detached: bool) {
            self.calls.lock().unwrap().push(Call {
                program: program.to_string(),
                args: args.to_vec(),
                detached,
            });
        }
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        async fn run(
            &self,
            program: &str,
            args: &[String],
            _cwd: Option<&Path>,
        ) -> io::Result<CommandOutput> {
            self.record(program, args, false);
            let code = if self.failing.contains(program) { 1 } else { 0 };
            Ok(CommandOutput {
                status_code: Some(code),
                stdout: self.stdout.get(program).cloned().unwrap_or_default(),
                stderr: if code == 0 { String::new() } else { format!("{program} broke") },
            })
        }

        fn spawn_detached(
            &self,
            program: &str,
            args: &[String],
            _cwd: Option<&Path>,
        ) -> io::Result<()> {
            self.record(program, args, true);
            if self.failing.contains(program) {
                Err(io::Error::other(format!("{program} broke")))
            } else {
                Ok(())
            }
        }

        async fn exists(&self, name: &str) -> bool {
            self.installed.contains(name)
        }
    }

    struct Fixture {
        runner: Arc<FakeRunner>,
        spawner: TerminalSpawner,
        scripts: TempDir,
        cwd: TempDir,
    }

    fn fixture(runner: FakeRunner, env: EnvSnapshot) -> Fixture {
        let runner = Arc::new(runner);
        let scripts = TempDir::new().unwrap();
        let spawner =
            TerminalSpawner::new(runner.clone(), env).with_script_dir(scripts.path());
        Fixture {
            runner,
            spawner,
            scripts,
            cwd: TempDir::new().unwrap(),
        }
    }

    fn script_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn linux_walks_chain_to_first_installed() {
        let f = fixture(
            FakeRunner::default().installed(&["kitty", "xterm"]),
            EnvSnapshot::new(Platform::Linux),
        );

        f.spawner
            .spawn(f.cwd.path(), "opencode --session s1", "feat")
            .await
            .unwrap();

        let calls = f.runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "kitty");
        assert!(calls[0].detached);

        let script = calls[0].args.last().unwrap();
        let content = std::fs::read_to_string(script).unwrap();
        assert!(content.contains("opencode --session s1"));
        assert_eq!(script_count(f.scripts.path()), 1);
    }

    #[tokio::test]
    async fn linux_falls_through_failing_terminal() {
        let f = fixture(
            FakeRunner::default()
                .installed(&["konsole", "xterm"])
                .failing(&["konsole"]),
            EnvSnapshot::new(Platform::Linux).with_var("KONSOLE_VERSION", "230804"),
        );

        f.spawner.spawn(f.cwd.path(), "opencode", "feat").await.unwrap();

        let programs: Vec<_> = f.runner.calls().into_iter().map(|c| c.program).collect();
        assert_eq!(programs, ["konsole", "xterm"]);
        // one script shared across attempts
        assert_eq!(script_count(f.scripts.path()), 1);
    }

    #[tokio::test]
    async fn linux_without_terminals_errors() {
        let f = fixture(FakeRunner::default(), EnvSnapshot::new(Platform::Linux));
        let err = f
            .spawner
            .spawn(f.cwd.path(), "opencode", "feat")
            .await
            .unwrap_err();
        assert!(matches!(err, TerminalError::NoTerminal { ref tried } if tried.is_empty()));
        assert!(f.runner.calls().is_empty());
    }

    #[tokio::test]
    async fn preferred_terminal_overrides_detection() {
        let f = fixture(
            FakeRunner::default().installed(&["alacritty", "kitty"]),
            EnvSnapshot::new(Platform::Linux).with_var("KITTY_WINDOW_ID", "1"),
        );
        let spawner = f.spawner.with_preferred(Some(Terminal::Alacritty));

        spawner.spawn(f.cwd.path(), "opencode", "feat").await.unwrap();
        assert_eq!(f.runner.calls()[0].program, "alacritty");
    }

    #[tokio::test]
    async fn tmux_sends_script_to_new_pane() {
        let f = fixture(
            FakeRunner::default().stdout("tmux", "%12\n"),
            EnvSnapshot::new(Platform::Linux).with_var("TMUX", "/tmp/tmux-1000/default,1,0"),
        );

        f.spawner.spawn(f.cwd.path(), "opencode", "feat").await.unwrap();

        let calls = f.runner.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].args[0], "new-window");
        assert_eq!(calls[1].args[..4], ["send-keys", "-t", "%12", "-l"]);
        assert!(calls[1].args[4].ends_with(".sh"));
        assert_eq!(calls[2].args, ["send-keys", "-t", "%12", "Enter"]);
    }

    #[tokio::test]
    async fn tmux_failure_is_reported() {
        let f = fixture(
            FakeRunner::default().failing(&["tmux"]),
            EnvSnapshot::new(Platform::Linux).with_var("TMUX", "x"),
        );
        let err = f
            .spawner
            .spawn(f.cwd.path(), "opencode", "feat")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("tmux broke"));
    }

    #[tokio::test]
    async fn zellij_types_script_and_enter() {
        let f = fixture(
            FakeRunner::default(),
            EnvSnapshot::new(Platform::MacOS).with_var("ZELLIJ", "0"),
        );
        f.spawner.spawn(f.cwd.path(), "opencode", "feat").await.unwrap();

        let calls = f.runner.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].args[..2], ["action", "write-chars"]);
        assert_eq!(calls[2].args, ["action", "write", "13"]);
    }

    #[tokio::test]
    async fn macos_ghostty_skips_script_then_falls_back() {
        let f = fixture(
            FakeRunner::default().failing(&["open"]),
            EnvSnapshot::new(Platform::MacOS).with_var("TERM_PROGRAM", "ghostty"),
        );

        f.spawner.spawn(f.cwd.path(), "opencode", "feat").await.unwrap();

        let programs: Vec<_> = f.runner.calls().into_iter().map(|c| c.program).collect();
        assert_eq!(programs, ["open", "osascript"]);
        // only the Terminal.app fallback needed a script
        assert_eq!(script_count(f.scripts.path()), 1);
    }

    #[tokio::test]
    async fn windows_uses_wt_when_available() {
        let f = fixture(
            FakeRunner::default().installed(&["wt.exe"]),
            EnvSnapshot::new(Platform::Windows),
        );
        f.spawner.spawn(f.cwd.path(), "opencode", "feat").await.unwrap();

        let calls = f.runner.calls();
        assert_eq!(calls[0].program, "wt.exe");
        assert!(calls[0].args.last().unwrap().ends_with(".bat"));
    }

    #[tokio::test]
    async fn wsl_without_wt_uses_cmd_start() {
        let f = fixture(
            FakeRunner::default(),
            EnvSnapshot::new(Platform::Linux).with_var("WSL_DISTRO_NAME", "Debian"),
        );
        f.spawner.spawn(f.cwd.path(), "opencode", "feat").await.unwrap();

        let calls = f.runner.calls();
        assert_eq!(calls[0].program, "cmd.exe");
        assert!(calls[0].args.contains(&"Debian".to_string()));
    }

    #[tokio::test]
    async fn missing_directory_is_rejected() {
        let f = fixture(FakeRunner::default(), EnvSnapshot::new(Platform::Linux));
        let err = f
            .spawner
            .spawn(&f.cwd.path().join("gone"), "opencode", "feat")
            .await
            .unwrap_err();
        assert!(matches!(err, TerminalError::MissingDirectory(_)));
    }
}
