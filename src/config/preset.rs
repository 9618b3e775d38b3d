//! Workspace presets (`<workspace>/.wtkit/workspace.jsonc`)

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{CONFIG_DIR, io::write_atomic};

const WORKSPACE_FILE: &str = "workspace.jsonc";

const DEFAULT_WORKSPACE_CONFIG: &str = r#"{
  // Named groups of repositories under main/, used with `wtkit create --preset <name>`
  // e.g. "backend": ["api", "worker"]
  "presets": {}
}
"#;

/// Workspace-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub presets: BTreeMap<String, Vec<String>>,
}

impl WorkspaceConfig {
    pub fn path_for(workspace_root: &Path) -> PathBuf {
        workspace_root.join(CONFIG_DIR).join(WORKSPACE_FILE)
    }

    /// Load presets, creating the file when it is missing.
    ///
    /// A malformed file falls back to no presets with a warning.
    pub fn load(workspace_root: &Path) -> Self {
        let path = Self::path_for(workspace_root);

        match std::fs::read_to_string(&path) {
            Ok(content) => json5::from_str(&content).unwrap_or_else(|e| {
                warn!("Invalid preset file {}: {}; ignoring presets", path.display(), e);
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                match write_atomic(&path, DEFAULT_WORKSPACE_CONFIG.as_bytes()) {
                    Ok(()) => info!("Created preset file at {}", path.display()),
                    Err(e) => warn!("Failed to create preset file {}: {:#}", path.display(), e),
                }
                Self::default()
            }
            Err(e) => {
                warn!("Failed to read {}: {}; ignoring presets", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.presets.get(name).map(Vec::as_slice)
    }

    /// Insert or replace a preset and persist the whole file.
    pub fn save_preset(workspace_root: &Path, name: &str, repos: &[String]) -> Result<Self> {
        validate_preset_name(name)?;
        if repos.is_empty() {
            bail!("preset '{name}' needs at least one repository");
        }

        let mut config = Self::load(workspace_root);
        config
            .presets
            .insert(name.to_string(), resolve_repos(None, repos));

        let content =
            serde_json::to_string_pretty(&config).context("Failed to serialize presets")?;
        write_atomic(&Self::path_for(workspace_root), content.as_bytes())?;
        Ok(config)
    }
}

/// Preset names: non-empty ASCII alphanumerics, `-` and `_`.
pub fn validate_preset_name(name: &str) -> Result<()> {
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        bail!("invalid preset name '{name}' (use letters, digits, '-' or '_')");
    }
    Ok(())
}

/// Ordered union of a preset's repositories and an explicit list.
///
/// Preset entries come first; duplicates and blank names are dropped.
pub fn resolve_repos(preset: Option<&[String]>, explicit: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    preset
        .unwrap_or_default()
        .iter()
        .chain(explicit)
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .filter(|r| seen.insert(r.to_string()))
        .map(str::to_string)
        .collect()
}
