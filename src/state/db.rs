//! SQLite-backed session state
//!
//! One database per project at `<data_dir>/projects/<id>/state.db`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, warn};

use super::StoreError;
use super::models::{Pending, PendingKind, Session};

const OPEN_ATTEMPTS: u32 = 3;
const OPEN_BACKOFF: Duration = Duration::from_millis(100);
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Handle to a project's state database
///
/// Constructed explicitly by the entry point and passed to whatever needs
/// it. Share it with `Arc` when a shutdown hook is registered.
pub struct StateStore {
    conn: Mutex<Option<Connection>>,
    path: PathBuf,
    shutdown_registered: AtomicBool,
}

impl StateStore {
    /// Open or create the store at `path`, retrying transient failures.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut attempt = 1;
        let conn = loop {
            match Self::connect(path) {
                Ok(conn) => break conn,
                Err(e) if attempt < OPEN_ATTEMPTS => {
                    warn!(
                        "Opening {} failed (attempt {}/{}): {}",
                        path.display(),
                        attempt,
                        OPEN_ATTEMPTS,
                        e
                    );
                    std::thread::sleep(OPEN_BACKOFF);
                    attempt += 1;
                }
                Err(source) => {
                    return Err(StoreError::Open {
                        path: path.to_path_buf(),
                        attempts: attempt,
                        source,
                    });
                }
            }
        };

        debug!("Opened state store {}", path.display());
        Ok(Self {
            conn: Mutex::new(Some(conn)),
            path: path.to_path_buf(),
            shutdown_registered: AtomicBool::new(false),
        })
    }

    /// [`StateStore::open`] on the blocking pool, so retry backoff never
    /// stalls a runtime worker.
    pub async fn open_async(path: &Path) -> Result<Self, StoreError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::open(&path)).await?
    }

    fn connect(path: &Path) -> rusqlite::Result<Connection> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(conn)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard: MutexGuard<'_, Option<Connection>> =
            self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let conn = guard.as_mut().ok_or(StoreError::Closed)?;
        f(conn)
    }

    /// Insert or replace the session with `session.id`.
    pub fn add_session(&self, session: &Session) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, branch, path, created_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    branch = excluded.branch,
                    path = excluded.path,
                    created_at = excluded.created_at",
                params![
                    session.id,
                    session.branch,
                    session.path.to_string_lossy(),
                    session.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_session(&self, id: &str) -> Result<Option<Session>, StoreError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, branch, path, created_at FROM sessions WHERE id = ?1",
                    params![id],
                    |r| {
                        Ok((
                            r.get::<_, String>(0)?,
                            r.get::<_, String>(1)?,
                            r.get::<_, String>(2)?,
                            r.get::<_, String>(3)?,
                        ))
                    },
                )
                .optional()?;

            row.map(|(id, branch, path, created_at)| {
                Ok(Session {
                    id,
                    branch,
                    path: PathBuf::from(path),
                    created_at: parse_timestamp(&created_at)?,
                })
            })
            .transpose()
        })
    }

    /// Delete every session on `branch`. Returns how many were removed.
    pub fn remove_session(&self, branch: &str) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM sessions WHERE branch = ?1", params![branch])?)
        })
    }

    /// Store `pending` as the one pending operation, replacing any other.
    pub fn set_pending(&self, kind: PendingKind, pending: &Pending) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;

            let existing: Option<(String, String)> = tx
                .query_row(
                    "SELECT kind, branch FROM pending_operation WHERE id = 1",
                    [],
                    |r| Ok((r.get(0)?, r.get(1)?)),
                )
                .optional()?;
            if let Some((old_kind, old_branch)) = existing {
                warn!(
                    "Pending {} for '{}' superseded by {} for '{}'",
                    old_kind, old_branch, kind, pending.branch
                );
            }

            tx.execute(
                "INSERT INTO pending_operation (id, kind, branch, path, session_id)
                 VALUES (1, ?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                    kind = excluded.kind,
                    branch = excluded.branch,
                    path = excluded.path,
                    session_id = excluded.session_id",
                params![
                    kind.as_str(),
                    pending.branch,
                    pending.path.to_string_lossy(),
                    pending.session_id,
                ],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    /// The pending operation, whatever its kind.
    pub fn peek_pending(&self) -> Result<Option<(PendingKind, Pending)>, StoreError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT kind, branch, path, session_id FROM pending_operation WHERE id = 1",
                    [],
                    |r| {
                        Ok((
                            r.get::<_, String>(0)?,
                            r.get::<_, String>(1)?,
                            r.get::<_, String>(2)?,
                            r.get::<_, Option<String>>(3)?,
                        ))
                    },
                )
                .optional()?;

            row.map(|(kind, branch, path, session_id)| {
                let kind = kind.parse::<PendingKind>().map_err(StoreError::Corrupt)?;
                Ok((
                    kind,
                    Pending {
                        branch,
                        path: PathBuf::from(path),
                        session_id,
                    },
                ))
            })
            .transpose()
        })
    }

    /// The pending operation if it is of `kind`.
    pub fn get_pending(&self, kind: PendingKind) -> Result<Option<Pending>, StoreError> {
        Ok(self
            .peek_pending()?
            .and_then(|(stored, pending)| (stored == kind).then_some(pending)))
    }

    /// Clear the slot if it holds a `kind` operation. Returns whether it did.
    pub fn clear_pending(&self, kind: PendingKind) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM pending_operation WHERE id = 1 AND kind = ?1",
                params![kind.as_str()],
            )?;
            Ok(deleted > 0)
        })
    }

    /// Fold the WAL back into the main database file.
    pub fn checkpoint(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
            Ok(())
        })
    }

    /// Checkpoint and close. Later calls fail with [`StoreError::Closed`].
    pub fn close(&self) -> Result<(), StoreError> {
        self.checkpoint()?;
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .take();
        if let Some(conn) = conn {
            conn.close().map_err(|(_, e)| StoreError::Sqlite(e))?;
        }
        debug!("Closed state store {}", self.path.display());
        Ok(())
    }

    /// Close the store when the process receives ctrl-c or SIGTERM, then exit.
    ///
    /// Only the first call per store installs the listener; returns whether
    /// this call did. Must be called inside a tokio runtime.
    pub fn register_shutdown_hook(self: &Arc<Self>) -> bool {
        if self.shutdown_registered.swap(true, Ordering::SeqCst) {
            return false;
        }

        let store = Arc::clone(self);
        tokio::spawn(async move {
            let signal = wait_for_termination().await;
            match store.close() {
                Ok(()) => info!("State store closed on {:?}", signal),
                Err(e) => warn!("Failed to close state store on shutdown: {}", e),
            }
            std::process::exit(signal.exit_code());
        });
        true
    }
}

/// Signal that ended the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Termination {
    Interrupt,
    Terminate,
}

impl Termination {
    /// Shell convention: 128 + signal number.
    fn exit_code(self) -> i32 {
        match self {
            Termination::Interrupt => 130,
            Termination::Terminate => 143,
        }
    }
}

async fn wait_for_termination() -> Termination {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => Termination::Interrupt,
                    _ = term.recv() => Termination::Terminate,
                }
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                Termination::Interrupt
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        Termination::Interrupt
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp '{value}': {e}")))
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    branch TEXT NOT NULL,
    path TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sessions_branch ON sessions(branch);

-- At most one row: the next lifecycle operation to run
CREATE TABLE IF NOT EXISTS pending_operation (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    kind TEXT NOT NULL CHECK (kind IN ('spawn', 'delete')),
    branch TEXT NOT NULL,
    path TEXT NOT NULL,
    session_id TEXT
);

CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);
INSERT OR IGNORE INTO schema_version VALUES (1);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, StateStore) {
        let dir = tempdir().unwrap();
        let store = StateStore::open(&dir.path().join("p").join("state.db")).unwrap();
        (dir, store)
    }

    fn pending(branch: &str) -> Pending {
        Pending {
            branch: branch.to_string(),
            path: PathBuf::from(format!("/trees/{branch}")),
            session_id: Some(format!("s-{branch}")),
        }
    }

    fn count(store: &StateStore, table: &str) -> i64 {
        store
            .with_conn(|conn| {
                Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
            })
            .unwrap()
    }

    #[test]
    fn open_creates_tables_in_wal_mode() {
        let (_dir, store) = store();
        let mode: String = store
            .with_conn(|conn| Ok(conn.query_row("PRAGMA journal_mode", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        assert_eq!(count(&store, "sessions"), 0);
        assert_eq!(count(&store, "pending_operation"), 0);
    }

    #[test]
    fn add_session_is_idempotent() {
        let (_dir, store) = store();
        store.add_session(&Session::new("s1", "feat", "/old")).unwrap();
        store.add_session(&Session::new("s1", "feat", "/new")).unwrap();

        assert_eq!(count(&store, "sessions"), 1);
        let session = store.get_session("s1").unwrap().unwrap();
        assert_eq!(session.path, PathBuf::from("/new"));
        assert!(store.get_session("missing").unwrap().is_none());
    }

    #[test]
    fn remove_session_by_branch() {
        let (_dir, store) = store();
        store.add_session(&Session::new("s1", "feat", "/a")).unwrap();
        store.add_session(&Session::new("s2", "other", "/b")).unwrap();

        assert_eq!(store.remove_session("feat").unwrap(), 1);
        assert!(store.get_session("s1").unwrap().is_none());
        assert!(store.get_session("s2").unwrap().is_some());
    }

    #[test]
    fn pending_is_a_single_slot() {
        let (_dir, store) = store();
        store.set_pending(PendingKind::Spawn, &pending("a")).unwrap();
        store.set_pending(PendingKind::Delete, &pending("b")).unwrap();

        assert_eq!(count(&store, "pending_operation"), 1);
        assert_eq!(store.get_pending(PendingKind::Spawn).unwrap(), None);
        assert_eq!(
            store.get_pending(PendingKind::Delete).unwrap(),
            Some(pending("b"))
        );
    }

    #[test]
    fn clear_only_matching_kind() {
        let (_dir, store) = store();
        store.set_pending(PendingKind::Delete, &pending("a")).unwrap();

        assert!(!store.clear_pending(PendingKind::Spawn).unwrap());
        assert!(store.get_pending(PendingKind::Delete).unwrap().is_some());
        assert!(store.clear_pending(PendingKind::Delete).unwrap());
        assert_eq!(store.peek_pending().unwrap(), None);
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.db");
        {
            let store = StateStore::open(&path).unwrap();
            store.add_session(&Session::new("s1", "feat", "/a")).unwrap();
            store.set_pending(PendingKind::Spawn, &pending("feat")).unwrap();
            store.close().unwrap();
        }

        let store = StateStore::open(&path).unwrap();
        assert_eq!(store.get_session("s1").unwrap().unwrap().branch, "feat");
        assert_eq!(
            store.get_pending(PendingKind::Spawn).unwrap(),
            Some(pending("feat"))
        );
    }

    #[test]
    fn closed_store_rejects_calls() {
        let (_dir, store) = store();
        store.close().unwrap();
        assert!(matches!(store.get_session("x"), Err(StoreError::Closed)));
    }

    #[test]
    fn open_fails_after_retries() {
        let dir = tempdir().unwrap();
        // a directory where the database file should be
        let path = dir.path().join("state.db");
        std::fs::create_dir_all(&path).unwrap();

        let err = StateStore::open(&path).err().unwrap();
        assert!(matches!(err, StoreError::Open { attempts: 3, .. }));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn open_async_keeps_the_runtime_responsive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.db");
        std::fs::create_dir_all(&path).unwrap();

        let ticked = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ticked);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            flag.store(true, Ordering::SeqCst);
        });

        // fails only after both backoff sleeps
        let err = StateStore::open_async(&path).await.err().unwrap();
        assert!(matches!(err, StoreError::Open { attempts: 3, .. }));
        assert!(ticked.load(Ordering::SeqCst));
    }

    #[test]
    fn termination_exit_codes_follow_the_signal() {
        assert_eq!(Termination::Interrupt.exit_code(), 130);
        assert_eq!(Termination::Terminate.exit_code(), 143);
    }

    #[tokio::test]
    async fn shutdown_hook_registers_once() {
        let (_dir, store) = store();
        let store = Arc::new(store);
        assert!(store.register_shutdown_hook());
        assert!(!store.register_shutdown_hook());
    }
}
