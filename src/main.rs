use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use wtkit::config::Settings;

mod cli;

#[derive(Parser)]
#[command(name = "wtkit")]
#[command(about = "Git worktrees for isolated development sessions")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a worktree set: one worktree per repository on the same branch
    Create {
        /// Branch name (created from --base if it does not exist)
        #[arg(short, long)]
        branch: String,

        /// Comma-separated repositories under main/
        #[arg(long, value_delimiter = ',')]
        repos: Vec<String>,

        /// Named preset of repositories (merged with --repos)
        #[arg(long)]
        preset: Option<String>,

        /// Base ref for new branches (defaults to HEAD)
        #[arg(long)]
        base: Option<String>,

        /// Workspace root (defaults to the nearest directory containing main/)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Skip postCreate hooks
        #[arg(long)]
        no_hooks: bool,
    },

    /// Remove a worktree set and its feature directory
    Remove {
        #[arg(short, long)]
        branch: String,

        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Skip preDelete hooks
        #[arg(long)]
        no_hooks: bool,
    },

    /// List worktree sets in the workspace
    List {
        #[arg(short, long)]
        workspace: Option<PathBuf>,
    },

    /// Manage repository presets
    Preset {
        #[command(subcommand)]
        command: cli::preset::PresetCommands,
    },

    /// Single-repo session lifecycle (for editor and agent plugins)
    Session {
        /// Repository (defaults to the current directory)
        #[arg(long, global = true)]
        repo: Option<PathBuf>,

        #[command(subcommand)]
        command: cli::session::SessionCommands,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::load().context("Failed to load settings")?;
    let cwd = std::env::current_dir().context("Failed to read current directory")?;

    match cli.command {
        Commands::Create {
            branch,
            repos,
            preset,
            base,
            workspace,
            no_hooks,
        } => {
            let args = cli::set::CreateArgs {
                branch,
                repos,
                preset,
                base,
                workspace,
                run_hooks: !no_hooks,
            };
            cli::set::create_command(&cwd, &settings, args).await
        }
        Commands::Remove {
            branch,
            workspace,
            yes,
            no_hooks,
        } => {
            cli::set::remove_command(&cwd, workspace.as_deref(), &branch, yes, !no_hooks).await
        }
        Commands::List { workspace } => cli::set::list_command(&cwd, workspace.as_deref()).await,
        Commands::Preset { command } => cli::preset::preset_command(&cwd, command),
        Commands::Session { repo, command } => {
            let repo = repo.unwrap_or(cwd);
            cli::session::session_command(&repo, settings, command).await
        }
    }
}
