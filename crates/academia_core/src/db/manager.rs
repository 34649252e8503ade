//! Per-thread connection ownership.
//!
//! # Responsibility
//! - Hand out exactly one live connection per calling thread.
//! - Probe cached handles and reopen them when they stop answering.
//!
//! # Invariants
//! - Handles are `Rc<Connection>`: they cannot be sent to another thread.
//! - Each manager owns a distinct slot in the thread-local cache, so two
//!   managers never observe each other's connections.
//! - The process-wide default manager is fixed by the first caller.

use super::open::{open_db, DbOptions};
use super::DbResult;
use log::{debug, info, warn};
use once_cell::sync::OnceCell;
use rusqlite::Connection;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_MANAGER_ID: AtomicU64 = AtomicU64::new(1);
static GLOBAL_MANAGER: OnceCell<ConnectionManager> = OnceCell::new();

thread_local! {
    static THREAD_CONNECTIONS: RefCell<HashMap<u64, Rc<Connection>>> =
        RefCell::new(HashMap::new());
}

/// Owns the database location and opens one connection per calling thread.
///
/// The manager itself is `Send + Sync`; share it by reference or `Arc` and
/// call [`ConnectionManager::connection_for_current_thread`] from each
/// worker thread.
#[derive(Debug)]
pub struct ConnectionManager {
    id: u64,
    path: PathBuf,
    options: DbOptions,
}

impl ConnectionManager {
    pub fn new(path: impl Into<PathBuf>, options: DbOptions) -> Self {
        Self {
            id: NEXT_MANAGER_ID.fetch_add(1, Ordering::Relaxed),
            path: path.into(),
            options,
        }
    }

    /// Returns the process-wide default manager.
    ///
    /// The first call fixes the database path for the whole process. Later
    /// calls with a different path do not reconfigure it: they log a warning
    /// and return the original manager. Prefer [`ConnectionManager::new`]
    /// and pass the manager explicitly where possible.
    pub fn global(path: impl AsRef<Path>, options: DbOptions) -> &'static ConnectionManager {
        let requested = path.as_ref();
        let manager = GLOBAL_MANAGER.get_or_init(|| {
            info!(
                "event=db_manager_init module=db status=ok path={}",
                requested.display()
            );
            ConnectionManager::new(requested, options)
        });
        if manager.path != requested {
            warn!(
                "event=db_manager_init module=db status=ignored active_path={} requested_path={}",
                manager.path.display(),
                requested.display()
            );
        }
        manager
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &DbOptions {
        &self.options
    }

    /// Returns the calling thread's connection, opening it on first use.
    ///
    /// A cached handle is probed with a trivial query; when the probe fails
    /// the handle is discarded and a fresh connection is opened.
    ///
    /// # Errors
    /// - Propagates open/configure/schema failures. Nothing is cached then.
    pub fn connection_for_current_thread(&self) -> DbResult<Rc<Connection>> {
        if let Some(conn) = self.cached() {
            if is_alive(&conn) {
                return Ok(conn);
            }
            warn!(
                "event=db_probe module=db status=error action=reopen path={}",
                self.path.display()
            );
            self.close_current_thread();
        }

        let conn = Rc::new(open_db(&self.path, &self.options)?);
        THREAD_CONNECTIONS.with(|slots| {
            slots.borrow_mut().insert(self.id, Rc::clone(&conn));
        });
        debug!(
            "event=db_thread_connect module=db status=ok thread={:?}",
            std::thread::current().id()
        );
        Ok(conn)
    }

    /// Releases the calling thread's connection.
    ///
    /// Returns `false` when the thread held none. Clones still held by the
    /// caller keep the underlying handle open until they are dropped.
    pub fn close_current_thread(&self) -> bool {
        THREAD_CONNECTIONS.with(|slots| slots.borrow_mut().remove(&self.id).is_some())
    }

    /// Returns whether the calling thread currently caches a connection.
    pub fn has_connection_on_current_thread(&self) -> bool {
        THREAD_CONNECTIONS.with(|slots| slots.borrow().contains_key(&self.id))
    }

    fn cached(&self) -> Option<Rc<Connection>> {
        THREAD_CONNECTIONS.with(|slots| slots.borrow().get(&self.id).cloned())
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        // Other threads release their slot when they exit.
        let id = self.id;
        let _ = THREAD_CONNECTIONS.try_with(|slots| slots.borrow_mut().remove(&id));
    }
}

/// Number of connections cached on the calling thread, across all managers.
pub fn open_connections_on_current_thread() -> usize {
    THREAD_CONNECTIONS.with(|slots| slots.borrow().len())
}

fn is_alive(conn: &Connection) -> bool {
    if liveness_check_forced_to_fail() {
        return false;
    }
    conn.query_row("SELECT 1;", [], |row| row.get::<_, i64>(0))
        .is_ok()
}

#[cfg(not(test))]
fn liveness_check_forced_to_fail() -> bool {
    false
}

#[cfg(test)]
fn liveness_check_forced_to_fail() -> bool {
    tests::FAIL_NEXT_LIVENESS_CHECK.with(|flag| flag.replace(false))
}
