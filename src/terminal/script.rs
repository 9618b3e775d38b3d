//! Temporary launch scripts
//!
//! Terminals are handed a script path instead of a command string, which
//! keeps quoting out of every terminal's own argument parser. Scripts are
//! written to the temp directory and deliberately left behind: the terminal
//! may not have read them yet when we return.

use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::escape::{escape_batch, quote_posix};

/// Script flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Posix,
    Batch,
}

impl ScriptKind {
    fn extension(self) -> &'static str {
        match self {
            Self::Posix => "sh",
            Self::Batch => "bat",
        }
    }
}

/// Bash script: `cd` into `cwd` (abort if that fails), run `command`,
/// then leave an interactive shell in the directory.
pub fn posix_script(cwd: &str, command: &str) -> String {
    format!(
        "#!/bin/bash\ncd {} || exit 1\n{}\nexec \"${{SHELL:-/bin/bash}}\"\n",
        quote_posix(cwd),
        command
    )
}

/// Batch script for `cmd /k`: the window stays open after `command`.
pub fn batch_script(cwd: &str, command: &str, title: &str) -> String {
    format!(
        "@echo off\r\ntitle {}\r\ncd /d {}\r\n{}\r\n",
        escape_batch(title),
        escape_batch(cwd),
        command
    )
}

/// Write `content` to `wtkit-<uuid>.<ext>` inside `dir` and make it
/// executable.
pub fn write_script(dir: &Path, kind: ScriptKind, content: &str) -> io::Result<PathBuf> {
    let path = dir.join(format!("wtkit-{}.{}", Uuid::new_v4(), kind.extension()));
    std::fs::write(&path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&path)?.permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms)?;
    }

    Ok(path)
}
