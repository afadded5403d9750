//! Per-entity storage traits and their SQLite implementations.
//!
//! # Responsibility
//! - One trait per entity, shaped by what the services ask for.
//! - Keep SQL, row parsing and constraint mapping out of the services.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `Duplicate`) in
//!   addition to DB transport errors.
//! - Slugs and timestamps are written by repositories on every save.

use crate::db::DbError;
use crate::model::page::PageRequest;
use log::warn;
use rusqlite::{ffi, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod category_repo;
pub mod entry_repo;
pub mod session_repo;
pub mod tag_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// No row with this id exists in `entity`'s table.
    NotFound { entity: &'static str, id: i64 },
    /// A unique constraint on `entity.field` rejected the write.
    Duplicate {
        entity: &'static str,
        field: &'static str,
    },
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Duplicate { entity, field } => {
                write!(f, "{entity} with the same {field} already exists")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Maps a unique-constraint failure to `RepoError::Duplicate`, leaving every
/// other error untouched.
pub(crate) fn map_unique_violation(
    err: rusqlite::Error,
    entity: &'static str,
    field: &'static str,
) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepoError::Duplicate { entity, field }
        }
        _ => err.into(),
    }
}

/// Runs `work` inside the savepoint `name`: released on success, rolled back
/// on error. Savepoints nest, so callers may already be inside one.
pub(crate) fn with_savepoint<T, E>(
    conn: &Connection,
    name: &str,
    work: impl FnOnce() -> Result<T, E>,
) -> Result<T, E>
where
    E: From<RepoError>,
{
    conn.execute_batch(&format!("SAVEPOINT {name};")).map_err(RepoError::from)?;
    match work() {
        Ok(value) => {
            conn.execute_batch(&format!("RELEASE {name};")).map_err(RepoError::from)?;
            Ok(value)
        }
        Err(err) => {
            let undo = format!("ROLLBACK TO {name}; RELEASE {name};");
            if let Err(rollback) = conn.execute_batch(&undo) {
                warn!(
                    "event=savepoint_rollback module=repo status=error name={name} error={rollback}"
                );
            }
            Err(err)
        }
    }
}

/// Fails with `MissingRequiredTable` for the first table not in the schema.
pub(crate) fn ensure_tables(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    let mut lookup =
        conn.prepare_cached("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;")?;
    for &table in tables {
        if !lookup.exists([table])? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

pub(crate) fn count_to_u64(value: i64) -> RepoResult<u64> {
    u64::try_from(value).map_err(|_| RepoError::InvalidData(format!("negative row count {value}")))
}

/// SQLite binds integers as `i64`; absurd page numbers are rejected here.
pub(crate) fn offset_param(page: PageRequest) -> RepoResult<i64> {
    i64::try_from(page.offset())
        .map_err(|_| RepoError::InvalidData(format!("page {} is out of range", page.page)))
}
