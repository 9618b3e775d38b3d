//! Records kept in the state store

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A live single-repo worktree tied to an interactive session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub branch: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>, branch: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            branch: branch.into(),
            path: path.into(),
            created_at: Utc::now(),
        }
    }
}

/// Type tag of the pending lifecycle operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingKind {
    Spawn,
    Delete,
}

impl PendingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spawn => "spawn",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for PendingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PendingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spawn" => Ok(Self::Spawn),
            "delete" => Ok(Self::Delete),
            other => Err(format!("unknown pending kind '{other}'")),
        }
    }
}

/// Payload of the pending operation slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pending {
    pub branch: String,
    pub path: PathBuf,
    pub session_id: Option<String>,
}

impl Pending {
    pub fn for_session(session: &Session) -> Self {
        Self {
            branch: session.branch.clone(),
            path: session.path.clone(),
            session_id: Some(session.id.clone()),
        }
    }
}
