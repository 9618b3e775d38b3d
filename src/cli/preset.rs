//! Preset commands

use anyhow::Result;
use clap::Subcommand;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use wtkit::config::WorkspaceConfig;
use wtkit::workspace;

#[derive(Subcommand)]
pub enum PresetCommands {
    /// Save (or overwrite) a named list of repositories
    Save {
        #[arg(long)]
        name: String,

        #[arg(long, value_delimiter = ',', required = true)]
        repos: Vec<String>,

        #[arg(short, long)]
        workspace: Option<PathBuf>,
    },

    /// Show saved presets
    List {
        #[arg(short, long)]
        workspace: Option<PathBuf>,
    },
}

pub fn preset_command(cwd: &Path, command: PresetCommands) -> Result<ExitCode> {
    match command {
        PresetCommands::Save {
            name,
            repos,
            workspace,
        } => {
            let root = workspace::resolve(workspace.as_deref(), cwd)?;
            let available = workspace::available_repos(&root)?;
            for repo in repos.iter().filter(|r| !available.contains(r)) {
                eprintln!("Warning: {repo} is not a repository under main/");
            }

            let config = WorkspaceConfig::save_preset(&root, &name, &repos)?;
            let saved = config.get(&name).unwrap_or_default();
            println!("Saved preset {}: {}", name, saved.join(", "));
        }
        PresetCommands::List { workspace } => {
            let root = workspace::resolve(workspace.as_deref(), cwd)?;
            let config = WorkspaceConfig::load(&root);
            if config.presets.is_empty() {
                println!("No presets. Save one with `wtkit preset save --name <n> --repos a,b`.");
            }
            for (name, repos) in &config.presets {
                println!("{}: {}", name, repos.join(", "));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
