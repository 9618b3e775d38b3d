//! Durable session state
//!
//! Records live single-repo sessions and the one pending lifecycle
//! operation (spawn or delete) to run when the interactive session goes
//! idle.

mod db;
mod models;
mod project;

pub use db::StateStore;
pub use models::{Pending, PendingKind, Session};
pub use project::{path_hash, project_dir, project_id, state_db_path};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open state store {} after {attempts} attempts: {source}", .path.display())]
    Open {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to create {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid stored value: {0}")]
    Corrupt(String),

    #[error("state store lock poisoned")]
    Poisoned,

    #[error("state store is closed")]
    Closed,

    #[error("state store open task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
