//! Login session storage.
//!
//! # Invariants
//! - Tokens are random UUID v4 strings and never reused.
//! - Sessions disappear with their user (`ON DELETE CASCADE`).
//! - A session older than [`SESSION_MAX_AGE_MS`] never resolves; expired
//!   rows are purged whenever a new session is opened.

use crate::db::NOW_MS_SQL;
use crate::model::user::UserId;
use crate::repo::{ensure_tables, RepoResult};
use log::debug;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

/// Lifetime of a login session, counted from sign-in.
pub const SESSION_MAX_AGE_MS: i64 = 7 * 24 * 60 * 60 * 1000;

pub trait SessionRepository {
    /// Opens a session for `user_id` and returns its token.
    fn create(&self, user_id: UserId) -> RepoResult<String>;
    fn find_user_id(&self, token: &str) -> RepoResult<Option<UserId>>;
    /// Removes a session; unknown tokens are ignored.
    fn delete(&self, token: &str) -> RepoResult<()>;
}

pub struct SqliteSessionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSessionRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["sessions"])?;
        Ok(Self { conn })
    }
}

impl SessionRepository for SqliteSessionRepository<'_> {
    fn create(&self, user_id: UserId) -> RepoResult<String> {
        let purged = self.conn.execute(
            &format!("DELETE FROM sessions WHERE created_at <= {NOW_MS_SQL} - ?1;"),
            [SESSION_MAX_AGE_MS],
        )?;
        if purged > 0 {
            debug!("event=session_purge module=repo status=ok removed={purged}");
        }

        let token = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO sessions (token, user_id) VALUES (?1, ?2);",
            rusqlite::params![token, user_id],
        )?;
        Ok(token)
    }

    fn find_user_id(&self, token: &str) -> RepoResult<Option<UserId>> {
        let user_id = self
            .conn
            .query_row(
                &format!(
                    "SELECT user_id FROM sessions
                     WHERE token = ?1 AND created_at > {NOW_MS_SQL} - ?2;"
                ),
                rusqlite::params![token, SESSION_MAX_AGE_MS],
                |row| row.get(0),
            )
            .optional()?;
        Ok(user_id)
    }

    fn delete(&self, token: &str) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM sessions WHERE token = ?1;", [token])?;
        Ok(())
    }
}
