//! Host environment detection
//!
//! Detection is a pure function of an [`EnvSnapshot`] so every branch can be
//! tested without touching the real process environment.

use std::collections::HashMap;
use std::fmt;

/// Operating system family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOS,
    Windows,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOS
        } else if cfg!(windows) {
            Self::Windows
        } else {
            Self::Linux
        }
    }
}

/// Terminal multiplexers that can host a new window/tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplexer {
    Tmux,
    Zellij,
}

/// Terminal emulators and launchers wtkit knows how to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminal {
    Ghostty,
    ITerm,
    AppleTerminal,
    Kitty,
    WezTerm,
    Alacritty,
    Foot,
    GnomeTerminal,
    Konsole,
    Xfce,
    Tilix,
    MateTerminal,
    Terminator,
    Xterm,
    XdgTerminalExec,
    XTerminalEmulator,
    WindowsTerminal,
    Cmd,
}

impl Terminal {
    /// Binary probed on PATH before launching
    pub fn binary(self) -> &'static str {
        match self {
            Self::Ghostty => "ghostty",
            Self::ITerm => "osascript",
            Self::AppleTerminal => "osascript",
            Self::Kitty => "kitty",
            Self::WezTerm => "wezterm",
            Self::Alacritty => "alacritty",
            Self::Foot => "foot",
            Self::GnomeTerminal => "gnome-terminal",
            Self::Konsole => "konsole",
            Self::Xfce => "xfce4-terminal",
            Self::Tilix => "tilix",
            Self::MateTerminal => "mate-terminal",
            Self::Terminator => "terminator",
            Self::Xterm => "xterm",
            Self::XdgTerminalExec => "xdg-terminal-exec",
            Self::XTerminalEmulator => "x-terminal-emulator",
            Self::WindowsTerminal => "wt.exe",
            Self::Cmd => "cmd",
        }
    }

    /// Parse a user-facing terminal name (settings `terminal = "..."`).
    pub fn from_name(name: &str) -> Option<Self> {
        let terminal = match name.trim().to_ascii_lowercase().as_str() {
            "ghostty" => Self::Ghostty,
            "iterm" | "iterm2" | "iterm.app" => Self::ITerm,
            "terminal" | "terminal.app" | "apple_terminal" => Self::AppleTerminal,
            "kitty" => Self::Kitty,
            "wezterm" => Self::WezTerm,
            "alacritty" => Self::Alacritty,
            "foot" => Self::Foot,
            "gnome-terminal" | "gnome" => Self::GnomeTerminal,
            "konsole" => Self::Konsole,
            "xfce4-terminal" | "xfce" => Self::Xfce,
            "tilix" => Self::Tilix,
            "mate-terminal" => Self::MateTerminal,
            "terminator" => Self::Terminator,
            "xterm" => Self::Xterm,
            "xdg-terminal-exec" => Self::XdgTerminalExec,
            "x-terminal-emulator" => Self::XTerminalEmulator,
            "wt" | "wt.exe" | "windows-terminal" => Self::WindowsTerminal,
            "cmd" | "cmd.exe" => Self::Cmd,
            _ => return None,
        };
        Some(terminal)
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ITerm => "iTerm",
            Self::AppleTerminal => "Terminal.app",
            Self::WindowsTerminal => "Windows Terminal",
            other => other.binary(),
        };
        f.write_str(name)
    }
}

/// Immutable view of the environment detection runs against
#[derive(Debug, Clone)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
    pub platform: Platform,
    /// Linux kernel release string (`/proc/sys/kernel/osrelease`)
    pub kernel_release: Option<String>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    pub fn capture() -> Self {
        let platform = Platform::current();
        let kernel_release = if platform == Platform::Linux {
            std::fs::read_to_string("/proc/sys/kernel/osrelease")
                .ok()
                .map(|s| s.trim().to_string())
        } else {
            None
        };

        Self {
            vars: std::env::vars().collect(),
            platform,
            kernel_release,
        }
    }

    /// Empty environment for `platform`.
    pub fn new(platform: Platform) -> Self {
        Self {
            vars: HashMap::new(),
            platform,
            kernel_release: None,
        }
    }

    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_kernel_release(mut self, release: &str) -> Self {
        self.kernel_release = Some(release.to_string());
        self
    }

    /// Value of `key` if set and non-empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// Where a new terminal surface should be opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// Inside a multiplexer: open a window/tab there
    Multiplexer(Multiplexer),
    /// Linux under WSL: open a Windows-side terminal running the distro
    Wsl { distro: Option<String> },
    /// Plain host, with the terminal we appear to be running in (if known)
    Native {
        platform: Platform,
        terminal: Option<Terminal>,
    },
}

/// Classify the environment. First match wins:
/// multiplexer, then WSL, then the platform's own terminal sniffing.
pub fn detect(env: &EnvSnapshot) -> Detection {
    if env.has("TMUX") {
        return Detection::Multiplexer(Multiplexer::Tmux);
    }
    if env.has("ZELLIJ") {
        return Detection::Multiplexer(Multiplexer::Zellij);
    }
    if env.platform == Platform::Linux && is_wsl(env) {
        return Detection::Wsl {
            distro: env.get("WSL_DISTRO_NAME").map(str::to_string),
        };
    }

    Detection::Native {
        platform: env.platform,
        terminal: sniff_terminal(env),
    }
}

fn is_wsl(env: &EnvSnapshot) -> bool {
    env.has("WSL_DISTRO_NAME")
        || env.has("WSLENV")
        || env
            .kernel_release
            .as_deref()
            .is_some_and(|r| r.to_ascii_lowercase().contains("microsoft"))
}

fn sniff_terminal(env: &EnvSnapshot) -> Option<Terminal> {
    match env.platform {
        Platform::Windows => env.has("WT_SESSION").then_some(Terminal::WindowsTerminal),
        Platform::MacOS => {
            if let Some(program) = env.get("TERM_PROGRAM") {
                match program {
                    "ghostty" => return Some(Terminal::Ghostty),
                    "iTerm.app" => return Some(Terminal::ITerm),
                    "Apple_Terminal" => return Some(Terminal::AppleTerminal),
                    "WezTerm" => return Some(Terminal::WezTerm),
                    _ => {}
                }
            }
            sniff_cross_platform(env)
        }
        Platform::Linux => {
            if let Some(program) = env.get("TERM_PROGRAM") {
                match program {
                    "ghostty" => return Some(Terminal::Ghostty),
                    "WezTerm" => return Some(Terminal::WezTerm),
                    _ => {}
                }
            }
            if let Some(found) = sniff_cross_platform(env) {
                return Some(found);
            }
            if env.has("KONSOLE_VERSION") {
                Some(Terminal::Konsole)
            } else if env.has("TILIX_ID") {
                Some(Terminal::Tilix)
            } else if env.has("TERMINATOR_UUID") {
                Some(Terminal::Terminator)
            } else if env.has("GNOME_TERMINAL_SCREEN") || env.has("GNOME_TERMINAL_SERVICE") {
                Some(Terminal::GnomeTerminal)
            } else if env.get("TERM").is_some_and(|t| t.starts_with("foot")) {
                Some(Terminal::Foot)
            } else {
                None
            }
        }
    }
}

fn sniff_cross_platform(env: &EnvSnapshot) -> Option<Terminal> {
    if env.has("KITTY_WINDOW_ID") {
        Some(Terminal::Kitty)
    } else if env.has("WEZTERM_PANE") {
        Some(Terminal::WezTerm)
    } else if env.has("ALACRITTY_WINDOW_ID") || env.has("ALACRITTY_SOCKET") {
        Some(Terminal::Alacritty)
    } else if env.has("GHOSTTY_RESOURCES_DIR") {
        Some(Terminal::Ghostty)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn native(env: &EnvSnapshot) -> Option<Terminal> {
        match detect(env) {
            Detection::Native { terminal, .. } => terminal,
            other => panic!("expected native detection, got {other:?}"),
        }
    }

    #[test]
    fn multiplexer_wins_over_platform() {
        let env = EnvSnapshot::new(Platform::MacOS)
            .with_var("TMUX", "/tmp/tmux-501/default,123,0")
            .with_var("TERM_PROGRAM", "iTerm.app");
        assert_eq!(detect(&env), Detection::Multiplexer(Multiplexer::Tmux));

        let env = EnvSnapshot::new(Platform::Linux)
            .with_var("ZELLIJ", "0")
            .with_var("WSL_DISTRO_NAME", "Ubuntu");
        assert_eq!(detect(&env), Detection::Multiplexer(Multiplexer::Zellij));
    }

    #[test]
    fn wsl_from_env_or_kernel_release() {
        let env = EnvSnapshot::new(Platform::Linux).with_var("WSL_DISTRO_NAME", "Ubuntu-22.04");
        assert_eq!(
            detect(&env),
            Detection::Wsl {
                distro: Some("Ubuntu-22.04".to_string())
            }
        );

        let env = EnvSnapshot::new(Platform::Linux)
            .with_kernel_release("5.15.153.1-microsoft-standard-WSL2");
        assert_eq!(detect(&env), Detection::Wsl { distro: None });
    }

    #[test]
    fn wslenv_on_windows_host_is_not_wsl() {
        let env = EnvSnapshot::new(Platform::Windows)
            .with_var("WSLENV", "WT_SESSION::WT_PROFILE_ID")
            .with_var("WT_SESSION", "abc");
        assert_eq!(native(&env), Some(Terminal::WindowsTerminal));
    }

    #[test]
    fn macos_term_program() {
        let cases = [
            ("iTerm.app", Terminal::ITerm),
            ("Apple_Terminal", Terminal::AppleTerminal),
            ("ghostty", Terminal::Ghostty),
            ("WezTerm", Terminal::WezTerm),
        ];
        for (value, expected) in cases {
            let env = EnvSnapshot::new(Platform::MacOS).with_var("TERM_PROGRAM", value);
            assert_eq!(native(&env), Some(expected), "TERM_PROGRAM={value}");
        }
    }

    #[test]
    fn linux_terminal_variables() {
        let cases = [
            ("KITTY_WINDOW_ID", Terminal::Kitty),
            ("WEZTERM_PANE", Terminal::WezTerm),
            ("ALACRITTY_SOCKET", Terminal::Alacritty),
            ("KONSOLE_VERSION", Terminal::Konsole),
            ("GNOME_TERMINAL_SCREEN", Terminal::GnomeTerminal),
            ("TILIX_ID", Terminal::Tilix),
        ];
        for (key, expected) in cases {
            let env = EnvSnapshot::new(Platform::Linux).with_var(key, "1");
            assert_eq!(native(&env), Some(expected), "{key}");
        }
    }

    #[test]
    fn apple_terminal_is_not_sniffed_on_linux() {
        let env = EnvSnapshot::new(Platform::Linux).with_var("TERM_PROGRAM", "Apple_Terminal");
        assert_eq!(native(&env), None);
    }

    #[test]
    fn empty_values_are_ignored() {
        let env = EnvSnapshot::new(Platform::Linux).with_var("TMUX", "");
        assert_eq!(
            detect(&env),
            Detection::Native {
                platform: Platform::Linux,
                terminal: None
            }
        );
    }

    #[test]
    fn terminal_names_parse() {
        assert_eq!(Terminal::from_name("Kitty"), Some(Terminal::Kitty));
        assert_eq!(Terminal::from_name("iterm2"), Some(Terminal::ITerm));
        assert_eq!(Terminal::from_name("nope"), None);
    }
}
