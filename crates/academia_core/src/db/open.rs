//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure durability/performance pragmas.
//! - Ensure the schema before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - File connections run in WAL mode unless explicitly disabled.

use super::schema::ensure_schema;
use super::{DbError, DbResult};
use crate::config::DatabaseConfig;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Pragmas applied to every connection opened by core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbOptions {
    /// Upper bound SQLite waits on a locked database before `SQLITE_BUSY`.
    pub busy_timeout: Duration,
    /// Page cache budget in KiB (applied as a negative `cache_size`).
    pub cache_size_kib: u32,
    /// Enables write-ahead-log journaling.
    pub wal: bool,
}

impl Default for DbOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_secs(5),
            cache_size_kib: 16 * 1024,
            wal: true,
        }
    }
}

impl From<&DatabaseConfig> for DbOptions {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
            cache_size_kib: config.cache_size_kib,
            wal: config.wal,
        }
    }
}

/// Opens a SQLite database file, configures it and ensures the schema.
///
/// # Errors
/// - [`DbError::Open`] when the engine cannot open the file.
/// - Any pragma or DDL failure; the half-configured handle is dropped.
pub fn open_db(path: impl AsRef<Path>, options: &DbOptions) -> DbResult<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file");

    let conn = match Connection::open(path) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=file duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(DbError::Open {
                path: path.to_path_buf(),
                source: err,
            });
        }
    };

    finish_open(conn, options, "file", started_at)
}

/// Opens an in-memory SQLite database with the full schema applied.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let conn = Connection::open_in_memory().map_err(|err| {
        error!(
            "event=db_open module=db status=error mode=memory error_code=db_open_failed error={}",
            err
        );
        DbError::Open {
            path: ":memory:".into(),
            source: err,
        }
    })?;

    finish_open(conn, &DbOptions::default(), "memory", started_at)
}

/// Applies core pragmas to an already opened connection.
pub fn configure_connection(conn: &Connection, options: &DbOptions) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(options.busy_timeout)?;
    if options.wal {
        // In-memory databases answer `memory`; only file databases switch.
        let _mode: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
    }
    conn.execute_batch(&format!(
        "PRAGMA cache_size = -{};
         PRAGMA temp_store = MEMORY;",
        options.cache_size_kib
    ))?;
    Ok(())
}

fn finish_open(
    mut conn: Connection,
    options: &DbOptions,
    mode: &str,
    started_at: Instant,
) -> DbResult<Connection> {
    let bootstrap = configure_connection(&conn, options).and_then(|()| ensure_schema(&mut conn));
    match bootstrap {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}
