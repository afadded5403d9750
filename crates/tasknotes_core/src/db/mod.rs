//! Database bootstrap for tasknotes.
//!
//! # Responsibility
//! - Hand out configured SQLite connections with the schema up to date.
//! - Report why a database cannot be used (I/O, SQLite, failed migration,
//!   schema from a newer release).
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - Repositories only ever see connections returned by [`open_db`] or
//!   [`open_db_in_memory`].

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Parent directory of a database file could not be created.
    Io { path: PathBuf, source: std::io::Error },
    /// A migration script failed; nothing from that script is kept.
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
    /// The file was written by a release with more migrations than this one.
    UnsupportedSchemaVersion { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::Io { path, source } => {
                write!(f, "cannot prepare {}: {source}", path.display())
            }
            Self::Migration {
                version,
                name,
                source,
            } => write!(f, "migration {version:04}_{name} failed: {source}"),
            Self::UnsupportedSchemaVersion { found, supported } => write!(
                f,
                "schema version {found} is newer than the {supported} this build understands"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Migration { source, .. } => Some(source),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Current time as epoch milliseconds, evaluated by SQLite.
///
/// Second resolution; every repository stamps rows with it.
pub(crate) const NOW_MS_SQL: &str = "(strftime('%s', 'now') * 1000)";
