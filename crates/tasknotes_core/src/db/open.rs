//! Connection setup.
//!
//! # Invariants
//! - Foreign keys are enforced on every returned connection, which is what
//!   makes `author_id` fall back to NULL when a user is deleted.
//! - File databases run in WAL mode so per-request connections can read
//!   while another request writes.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{debug, error};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

enum Target<'a> {
    File(&'a Path),
    Memory,
}

impl Target<'_> {
    fn label(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }
}

/// Opens (creating if needed) the database file at `path`, migrated to the
/// latest schema. Missing parent directories are created.
///
/// Called once per web request, so success is only logged at `debug`.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open(Target::File(path.as_ref()))
}

/// Opens a private in-memory database with the full schema; used by tests
/// and one-off tooling.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open(Target::Memory)
}

fn open(target: Target<'_>) -> DbResult<Connection> {
    let started = Instant::now();
    let mode = target.label();
    let result = connect(&target).and_then(|mut conn| {
        configure(&conn, &target)?;
        apply_migrations(&mut conn)?;
        Ok(conn)
    });
    let elapsed = started.elapsed().as_millis();
    match &result {
        Ok(_) => debug!("event=db_open module=db status=ok mode={mode} duration_ms={elapsed}"),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={elapsed} error={err}"
        ),
    }
    result
}

fn connect(target: &Target<'_>) -> DbResult<Connection> {
    match target {
        Target::File(path) => {
            if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|source| DbError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            Ok(Connection::open(path)?)
        }
        Target::Memory => Ok(Connection::open_in_memory()?),
    }
}

fn configure(conn: &Connection, target: &Target<'_>) -> DbResult<()> {
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    if let Target::File(_) = target {
        // journal_mode answers with the resulting mode, so it must be queried.
        let _mode: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
    }
    Ok(())
}
