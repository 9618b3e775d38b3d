//! Session lifecycle commands

use anyhow::Result;
use clap::Subcommand;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use wtkit::config::Settings;
use wtkit::tools::Tools;

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Create a worktree and queue a terminal for it
    Create {
        #[arg(short, long)]
        branch: String,

        #[arg(long)]
        base: Option<String>,

        /// Session id to resume in the new terminal (generated if omitted)
        #[arg(long)]
        id: Option<String>,
    },

    /// Queue removal of a session's worktree
    Delete {
        #[arg(long)]
        id: String,

        #[arg(long, default_value = "session finished")]
        reason: String,
    },

    /// Run the pending operation, if any
    Idle,
}

pub async fn session_command(
    repo: &Path,
    settings: Settings,
    command: SessionCommands,
) -> Result<ExitCode> {
    let launcher = Arc::new(wtkit::system_spawner(&settings));
    let tools = Tools::new(repo, settings, launcher);

    let message = match command {
        SessionCommands::Create { branch, base, id } => {
            tools
                .worktree_create(&branch, base.as_deref(), id.as_deref())
                .await
        }
        SessionCommands::Delete { id, reason } => tools.worktree_delete(&id, &reason).await,
        SessionCommands::Idle => tools.session_idle().await,
    };

    println!("{message}");
    if message.starts_with("Error:") {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
