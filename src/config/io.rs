//! Configuration file I/O operations

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use super::Settings;

impl Settings {
    /// Get the global config directory path (~/.wtkit/)
    pub fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".wtkit")
    }

    /// Get the global config file path (~/.wtkit/config.toml)
    pub fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    /// Load settings from a file without applying environment overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(settings)
    }

    /// Save settings with an exclusive lock and an atomic rename.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?;
        write_atomic(path, content.as_bytes())
    }

    /// Load global settings from ~/.wtkit/config.toml.
    ///
    /// Creates the file with defaults when it does not exist, then applies
    /// `WTKIT_*` environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::global_config_path();
        Self::load_from(&path)
    }

    /// [`Settings::load`] against an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            Self::auto_init(path)?;
        }

        let mut settings = Self::from_file(path)?;
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Write defaults unless another process got there first.
    fn auto_init(path: &Path) -> Result<()> {
        let _lock = lock_for(path)?;

        // Re-check after acquiring the lock (another process may have created it)
        if path.exists() {
            return Ok(());
        }

        let content = toml::to_string_pretty(&Self::default())
            .with_context(|| "Failed to serialize default config")?;
        write_temp_and_rename(path, content.as_bytes())?;
        tracing::info!("Created default config at {}", path.display());
        Ok(())
    }
}

/// Write `content` to `path` atomically while holding `<path>.lock`.
///
/// The parent directory is created if needed. The lock is released when
/// the function returns.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let _lock = lock_for(path)?;
    write_temp_and_rename(path, content)
}

fn lock_for(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create config directory: {}", parent.display())
        })?;
    }

    let lock_path = sibling_with_suffix(path, "lock");
    let lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&lock_path)
        .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;

    lock_file
        .lock_exclusive()
        .with_context(|| "Failed to acquire config lock")?;

    Ok(lock_file)
}

fn write_temp_and_rename(path: &Path, content: &[u8]) -> Result<()> {
    let temp_path = sibling_with_suffix(path, "tmp");
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

    temp_file
        .write_all(content)
        .with_context(|| "Failed to write config content")?;

    temp_file
        .sync_all()
        .with_context(|| "Failed to sync config file")?;

    std::fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename config file: {}", path.display()))?;

    Ok(())
}

/// `config.toml` -> `config.toml.<suffix>`
fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_from_creates_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.toml");

        let settings = Settings::load_from(&path).unwrap();
        assert!(path.exists());
        assert!(!settings.command.is_empty());
    }

    #[test]
    fn save_then_load_keeps_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");

        let settings = Settings {
            command: "my-agent".to_string(),
            terminal: Some("kitty".to_string()),
            ..Settings::default()
        };
        settings.save_to_file(&path).unwrap();

        let loaded = Settings::from_file(&path).unwrap();
        assert_eq!(loaded.command, "my-agent");
        assert_eq!(loaded.terminal.as_deref(), Some("kitty"));
        assert!(!sibling_with_suffix(&path, "tmp").exists());
    }

    #[test]
    fn sibling_suffix_appends() {
        let p = Path::new("/a/workspace.jsonc");
        assert_eq!(sibling_with_suffix(p, "lock"), PathBuf::from("/a/workspace.jsonc.lock"));
    }
}
