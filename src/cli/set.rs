//! create / remove / list for worktree sets

use anyhow::Result;
use dialoguer::Confirm;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use wtkit::config::Settings;
use wtkit::set::{self, CreateSet};
use wtkit::tools::{describe_removal, describe_set, describe_sets};
use wtkit::workspace;

pub struct CreateArgs {
    pub branch: String,
    pub repos: Vec<String>,
    pub preset: Option<String>,
    pub base: Option<String>,
    pub workspace: Option<PathBuf>,
    pub run_hooks: bool,
}

/// Create a set; fails when no repository could be set up.
pub async fn create_command(cwd: &Path, settings: &Settings, args: CreateArgs) -> Result<ExitCode> {
    let root = workspace::resolve(args.workspace.as_deref(), cwd)?;
    let repos = workspace::select_repos(&root, args.preset.as_deref(), &args.repos)?;

    println!("Creating {} in {} repositories...", args.branch, repos.len());

    let request = CreateSet {
        workspace_root: &root,
        branch: &args.branch,
        base: args.base.as_deref(),
        repos: &repos,
        run_hooks: args.run_hooks,
    };
    let spawner = wtkit::system_spawner(settings);
    let result = set::create_set(&request, &spawner, &settings.command).await;

    println!("{}", describe_set(&result));

    if result.success_count == 0 {
        return Ok(ExitCode::FAILURE);
    }
    if !result.terminal_launched {
        eprintln!(
            "Could not open a terminal; run `cd {}` yourself.",
            result.feature_path.display()
        );
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn remove_command(
    cwd: &Path,
    workspace: Option<&Path>,
    branch: &str,
    yes: bool,
    hooks: bool,
) -> Result<ExitCode> {
    let root = workspace::resolve(workspace, cwd)?;

    if !yes {
        if !std::io::stdin().is_terminal() {
            eprintln!("Refusing to remove {branch} without --yes in a non-interactive shell.");
            return Ok(ExitCode::FAILURE);
        }

        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove every worktree of {branch}? Uncommitted changes are lost."
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(ExitCode::FAILURE);
        }
    }

    let result = set::remove_set(&root, branch, hooks).await?;
    println!("{}", describe_removal(&result));
    if !result.errors.is_empty() {
        eprintln!("Some worktrees were not removed cleanly; `git worktree prune` in main/ tidies up.");
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn list_command(cwd: &Path, workspace: Option<&Path>) -> Result<ExitCode> {
    let root = workspace::resolve(workspace, cwd)?;
    let sets = set::list_sets(&root).await?;
    println!("{}", describe_sets(&sets));
    Ok(ExitCode::SUCCESS)
}
