//! Pure launch plans: which program to run with which arguments.

use super::detect::{Platform, Terminal};
use super::escape::{escape_applescript, escape_posix, quote_posix};

/// How the launcher process is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Launcher exits quickly once the terminal is up; its status counts
    Wait,
    /// Launcher *is* the terminal; start it and let go
    Detach,
}

/// A single process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub mode: LaunchMode,
}

impl Invocation {
    fn new(program: &str, args: Vec<String>, mode: LaunchMode) -> Self {
        Self {
            program: program.to_string(),
            args,
            mode,
        }
    }

    fn wait(program: &str, args: Vec<String>) -> Self {
        Self::new(program, args, LaunchMode::Wait)
    }

    fn detach(program: &str, args: Vec<String>) -> Self {
        Self::new(program, args, LaunchMode::Detach)
    }
}

/// What gets opened: a directory, the command, and a script wrapping both
#[derive(Debug, Clone, Copy)]
pub struct LaunchTarget<'a> {
    pub cwd: &'a str,
    pub command: &'a str,
    pub name: &'a str,
    /// Path of the launch script (`.sh`, or `.bat` on Windows)
    pub script: &'a str,
}

// Linux fallback tiers, tried in order after the detected terminal.
const PREFERRED: &[Terminal] = &[Terminal::XdgTerminalExec];
const ALTERNATIVES: &[Terminal] = &[Terminal::XTerminalEmulator];
const MODERN: &[Terminal] = &[
    Terminal::Ghostty,
    Terminal::Kitty,
    Terminal::WezTerm,
    Terminal::Alacritty,
    Terminal::Foot,
];
const DESKTOP: &[Terminal] = &[
    Terminal::GnomeTerminal,
    Terminal::Konsole,
    Terminal::Xfce,
    Terminal::Tilix,
    Terminal::MateTerminal,
    Terminal::Terminator,
];
const UNIVERSAL: &[Terminal] = &[Terminal::Xterm];

/// Linux candidates: `detected` first, then the fallback tiers.
pub fn linux_candidates(detected: Option<Terminal>) -> Vec<Terminal> {
    let mut list: Vec<Terminal> = detected.into_iter().collect();
    for tier in [PREFERRED, ALTERNATIVES, MODERN, DESKTOP, UNIVERSAL] {
        for &terminal in tier {
            if !list.contains(&terminal) {
                list.push(terminal);
            }
        }
    }
    list
}

/// Whether launching `terminal` on `platform` needs the temp script.
pub fn needs_script(terminal: Terminal, platform: Platform) -> bool {
    !(terminal == Terminal::Ghostty && platform == Platform::MacOS)
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Invocation for opening `target` in `terminal`.
pub fn terminal_invocation(
    terminal: Terminal,
    platform: Platform,
    target: &LaunchTarget<'_>,
) -> Invocation {
    let LaunchTarget {
        cwd,
        command,
        name,
        script,
    } = *target;

    match terminal {
        Terminal::Ghostty if platform == Platform::MacOS => {
            // the .app bundle only accepts an inline command via `open --args`
            let inline = format!("cd {} && {}", quote_posix(cwd), command);
            Invocation::wait(
                "open",
                vec![
                    "-na".into(),
                    "Ghostty".into(),
                    "--args".into(),
                    format!("--working-directory={cwd}"),
                    "-e".into(),
                    "bash".into(),
                    "-c".into(),
                    inline,
                ],
            )
        }
        Terminal::Ghostty => Invocation::detach(
            "ghostty",
            vec![
                format!("--working-directory={cwd}"),
                format!("--title={name}"),
                "-e".into(),
                script.into(),
            ],
        ),
        Terminal::ITerm => Invocation::wait(
            "osascript",
            vec![
                "-e".into(),
                format!(
                    "tell application \"iTerm\"\n\tactivate\n\tcreate window with default profile command \"{}\"\nend tell",
                    escape_applescript(script)
                ),
            ],
        ),
        Terminal::AppleTerminal => Invocation::wait(
            "osascript",
            vec![
                "-e".into(),
                format!(
                    "tell application \"Terminal\"\n\tactivate\n\tdo script \"{}\"\nend tell",
                    escape_applescript(script)
                ),
            ],
        ),
        Terminal::Kitty => Invocation::detach(
            "kitty",
            owned(&["--directory", cwd, "--title", name, script]),
        ),
        Terminal::WezTerm => {
            Invocation::detach("wezterm", owned(&["start", "--cwd", cwd, "--", script]))
        }
        Terminal::Alacritty => Invocation::detach(
            "alacritty",
            owned(&["--working-directory", cwd, "--title", name, "-e", script]),
        ),
        Terminal::Foot => Invocation::detach(
            "foot",
            vec![
                format!("--working-directory={cwd}"),
                format!("--title={name}"),
                script.into(),
            ],
        ),
        Terminal::GnomeTerminal => Invocation::wait(
            "gnome-terminal",
            vec![
                format!("--working-directory={cwd}"),
                format!("--title={name}"),
                "--".into(),
                script.into(),
            ],
        ),
        Terminal::Konsole => Invocation::detach(
            "konsole",
            vec![
                "--workdir".into(),
                cwd.into(),
                "-p".into(),
                format!("tabtitle={name}"),
                "-e".into(),
                script.into(),
            ],
        ),
        Terminal::Xfce => Invocation::detach(
            "xfce4-terminal",
            vec![
                format!("--working-directory={cwd}"),
                format!("--title={name}"),
                "-x".into(),
                script.into(),
            ],
        ),
        Terminal::Tilix => Invocation::detach(
            "tilix",
            vec![
                format!("--working-directory={cwd}"),
                format!("--title={name}"),
                "-e".into(),
                script.into(),
            ],
        ),
        Terminal::MateTerminal => Invocation::detach(
            "mate-terminal",
            vec![
                format!("--working-directory={cwd}"),
                format!("--title={name}"),
                "-x".into(),
                script.into(),
            ],
        ),
        Terminal::Terminator => Invocation::detach(
            "terminator",
            vec![
                format!("--working-directory={cwd}"),
                "-T".into(),
                name.into(),
                "-x".into(),
                script.into(),
            ],
        ),
        Terminal::Xterm => Invocation::detach("xterm", owned(&["-T", name, "-e", script])),
        Terminal::XdgTerminalExec => Invocation::detach(
            "xdg-terminal-exec",
            vec![format!("--dir={cwd}"), format!("--title={name}"), script.into()],
        ),
        Terminal::XTerminalEmulator => {
            Invocation::detach("x-terminal-emulator", owned(&["-e", script]))
        }
        Terminal::WindowsTerminal => Invocation::wait(
            "wt.exe",
            owned(&[
                "-w", "0", "new-tab", "--title", name, "-d", cwd, "cmd", "/k", script,
            ]),
        ),
        // `start` takes its first quoted argument as the window title
        Terminal::Cmd => Invocation::wait(
            "cmd",
            owned(&["/c", "start", "", "/d", cwd, "cmd", "/k", script]),
        ),
    }
}

/// tmux: open a window and report its pane id on stdout.
pub fn tmux_new_window(target: &LaunchTarget<'_>) -> Invocation {
    Invocation::wait(
        "tmux",
        owned(&[
            "new-window",
            "-P",
            "-F",
            "#{pane_id}",
            "-n",
            target.name,
            "-c",
            target.cwd,
        ]),
    )
}

/// tmux: type `script` literally into `pane`, then press Enter.
pub fn tmux_send(pane: &str, script: &str) -> [Invocation; 2] {
    let typed = typed_path(script);
    [
        Invocation::wait("tmux", owned(&["send-keys", "-t", pane, "-l", typed.as_str()])),
        Invocation::wait("tmux", owned(&["send-keys", "-t", pane, "Enter"])),
    ]
}

/// zellij: new tab, literal script text, then a carriage return.
pub fn zellij_plan(target: &LaunchTarget<'_>) -> [Invocation; 3] {
    [
        Invocation::wait(
            "zellij",
            owned(&[
                "action",
                "new-tab",
                "--name",
                target.name,
                "--cwd",
                target.cwd,
            ]),
        ),
        Invocation::wait(
            "zellij",
            owned(&["action", "write-chars", typed_path(target.script).as_str()]),
        ),
        Invocation::wait("zellij", owned(&["action", "write", "13"])),
    ]
}

/// Script path as typed into the user's interactive shell
fn typed_path(script: &str) -> String {
    format!("\"{}\"", escape_posix(script))
}

/// WSL: a Windows-side terminal that runs the script inside the distro.
pub fn wsl_invocation(
    distro: Option<&str>,
    windows_terminal: bool,
    target: &LaunchTarget<'_>,
) -> Invocation {
    let mut wsl = vec!["wsl.exe".to_string()];
    if let Some(distro) = distro {
        wsl.push("-d".into());
        wsl.push(distro.into());
    }
    wsl.push("--".into());
    wsl.push(target.script.into());

    if windows_terminal {
        let mut args = owned(&["-w", "0", "new-tab", "--title", target.name]);
        args.extend(wsl);
        Invocation::wait("wt.exe", args)
    } else {
        let mut args = owned(&["/c", "start", ""]);
        args.extend(wsl);
        Invocation::wait("cmd.exe", args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> LaunchTarget<'static> {
        LaunchTarget {
            cwd: "/work/feat \"x\"",
            command: "opencode --session s1",
            name: "feat",
            script: "/tmp/wtkit-1.sh",
        }
    }

    #[test]
    fn linux_candidates_order() {
        let list = linux_candidates(None);
        assert_eq!(list.first(), Some(&Terminal::XdgTerminalExec));
        assert_eq!(list.get(1), Some(&Terminal::XTerminalEmulator));
        assert_eq!(list.last(), Some(&Terminal::Xterm));

        let ghostty = list.iter().position(|t| *t == Terminal::Ghostty).unwrap();
        let gnome = list.iter().position(|t| *t == Terminal::GnomeTerminal).unwrap();
        assert!(ghostty < gnome);
    }

    #[test]
    fn detected_terminal_goes_first_once() {
        let list = linux_candidates(Some(Terminal::Konsole));
        assert_eq!(list[0], Terminal::Konsole);
        assert_eq!(list.iter().filter(|t| **t == Terminal::Konsole).count(), 1);
    }

    #[test]
    fn macos_ghostty_runs_inline() {
        let inv = terminal_invocation(Terminal::Ghostty, Platform::MacOS, &target());
        assert_eq!(inv.program, "open");
        assert_eq!(inv.mode, LaunchMode::Wait);
        assert_eq!(
            inv.args.last().unwrap(),
            "cd '/work/feat \"x\"' && opencode --session s1"
        );
        assert!(!inv.args.iter().any(|a| a.contains("wtkit-1.sh")));
        assert!(!needs_script(Terminal::Ghostty, Platform::MacOS));
        assert!(needs_script(Terminal::Ghostty, Platform::Linux));
    }

    #[test]
    fn apple_terminal_runs_script_via_osascript() {
        let mut t = target();
        t.script = "/tmp/dir \"q\"/wtkit-1.sh";
        let inv = terminal_invocation(Terminal::AppleTerminal, Platform::MacOS, &t);
        assert_eq!(inv.program, "osascript");
        assert_eq!(inv.args[0], "-e");
        assert!(inv.args[1].contains("do script \"/tmp/dir \\\"q\\\"/wtkit-1.sh\""));
    }

    #[test]
    fn cmd_start_gets_empty_title() {
        let mut t = target();
        t.script = r"C:\Temp\wtkit-1.bat";
        let inv = terminal_invocation(Terminal::Cmd, Platform::Windows, &t);
        assert_eq!(inv.args[..3], ["/c", "start", ""]);
        assert_eq!(inv.args.last().unwrap(), r"C:\Temp\wtkit-1.bat");
    }

    #[test]
    fn tmux_sends_literal_then_enter() {
        let new_window = tmux_new_window(&target());
        assert!(new_window.args.contains(&"#{pane_id}".to_string()));

        let [keys, enter] = tmux_send("%7", "/tmp/wtkit-1.sh");
        assert_eq!(keys.args, ["send-keys", "-t", "%7", "-l", "\"/tmp/wtkit-1.sh\""]);
        assert_eq!(enter.args, ["send-keys", "-t", "%7", "Enter"]);
    }

    #[test]
    fn wsl_prefers_windows_terminal() {
        let inv = wsl_invocation(Some("Ubuntu"), true, &target());
        assert_eq!(inv.program, "wt.exe");
        assert!(inv.args.ends_with(&[
            "wsl.exe".to_string(),
            "-d".into(),
            "Ubuntu".into(),
            "--".into(),
            "/tmp/wtkit-1.sh".into()
        ]));

        let inv = wsl_invocation(None, false, &target());
        assert_eq!(inv.program, "cmd.exe");
        assert_eq!(inv.args[..4], ["/c", "start", "", "wsl.exe"]);
    }
}
