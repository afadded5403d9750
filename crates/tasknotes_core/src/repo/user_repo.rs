//! User repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Emails are unique case-insensitively (`COLLATE NOCASE` index).
//! - Deleting a user nulls `author_id` on their tasks/notes instead of
//!   deleting them, and drops their sessions.

use crate::model::page::{Page, PageRequest};
use crate::model::user::{roles_from_db, User, UserId};
use crate::repo::{
    count_to_u64, ensure_tables, map_unique_violation, offset_param, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT id, email, name, password, roles FROM users";

/// Repository interface for user accounts.
pub trait UserRepository {
    fn find_one_by_id(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_one_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    /// Lists users ordered by email.
    fn query_all(&self, page: PageRequest) -> RepoResult<Page<User>>;
    /// Inserts (when `user.id` is `None`) or updates, assigning `user.id`.
    fn save(&self, user: &mut User) -> RepoResult<UserId>;
    fn delete(&self, id: UserId) -> RepoResult<()>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["users"])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn find_one_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }

    fn find_one_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE email = ?1;"),
                [email.trim()],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }

    fn query_all(&self, page: PageRequest) -> RepoResult<Page<User>> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))?;

        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL} ORDER BY email ASC, id ASC LIMIT ?1 OFFSET ?2;"
        ))?;
        let rows = stmt.query_map(
            params![i64::from(page.per_page), offset_param(page)?],
            parse_user_row,
        )?;
        let users = rows.collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(users, page, count_to_u64(total)?))
    }

    fn save(&self, user: &mut User) -> RepoResult<UserId> {
        let email = user.email.trim().to_string();
        let roles = user.roles_to_db();

        match user.id {
            None => {
                let id: UserId = self
                    .conn
                    .query_row(
                        "INSERT INTO users (email, name, password, roles)
                         VALUES (?1, ?2, ?3, ?4)
                         RETURNING id;",
                        params![email, user.name, user.password, roles],
                        |row| row.get(0),
                    )
                    .map_err(|err| map_unique_violation(err, "user", "email"))?;
                user.id = Some(id);
                user.email = email;
                Ok(id)
            }
            Some(id) => {
                let changed = self
                    .conn
                    .execute(
                        "UPDATE users
                         SET email = ?1, name = ?2, password = ?3, roles = ?4
                         WHERE id = ?5;",
                        params![email, user.name, user.password, roles, id],
                    )
                    .map_err(|err| map_unique_violation(err, "user", "email"))?;
                if changed == 0 {
                    return Err(RepoError::NotFound { entity: "user", id });
                }
                user.email = email;
                Ok(id)
            }
        }
    }

    fn delete(&self, id: UserId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM users WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "user", id });
        }
        Ok(())
    }
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let roles: String = row.get("roles")?;
    Ok(User::from_parts(
        row.get("id")?,
        row.get("email")?,
        row.get("name")?,
        row.get("password")?,
        roles_from_db(&roles),
    ))
}
