//! Task/note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Build filtered, paginated list queries for one entry kind.
//! - Own tag-link replacement on save with atomic semantics.
//!
//! # Invariants
//! - Lists are ordered by `updated_at DESC, id DESC`.
//! - `save` writes the row and its full tag set in a single savepoint, so it
//!   can run inside [`EntryRepository::within_transaction`].
//! - `updated_at` is written as `MAX(created_at, now)` so it never precedes
//!   `created_at`.

use crate::db::NOW_MS_SQL;
use crate::model::category::Category;
use crate::model::entry::{Entry, EntryFilters, EntryId, EntryKind, EntryRecord};
use crate::model::page::{Page, PageRequest};
use crate::model::tag::Tag;
use crate::model::user::UserId;
use crate::repo::tag_repo::parse_tag_row;
use crate::repo::{
    count_to_u64, ensure_tables, offset_param, with_savepoint, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

/// Repository interface for one entry kind (tasks or notes).
pub trait EntryRepository {
    /// Kind served by this repository.
    fn kind(&self) -> EntryKind;
    /// Lists every entry matching `filters`.
    fn query_all(&self, filters: &EntryFilters, page: PageRequest)
        -> RepoResult<Page<EntryRecord>>;
    /// Lists entries authored by `author` matching `filters`.
    fn query_by_author(
        &self,
        author: UserId,
        filters: &EntryFilters,
        page: PageRequest,
    ) -> RepoResult<Page<EntryRecord>>;
    fn find_one_by_id(&self, id: EntryId) -> RepoResult<Option<EntryRecord>>;
    /// Inserts (when `entry.id` is `None`) or updates, replacing tag links.
    ///
    /// On insert, preset `created_at`/`updated_at` are kept (fixtures use
    /// this); otherwise both default to now.
    fn save(&self, entry: &mut Entry) -> RepoResult<EntryId>;
    fn delete(&self, id: EntryId) -> RepoResult<()>;
    /// Runs `work` atomically: every write it makes through repositories on
    /// the same connection is rolled back when it fails.
    fn within_transaction<T, E>(&self, work: impl FnOnce() -> Result<T, E>) -> Result<T, E>
    where
        E: From<RepoError>;
}

/// SQLite-backed entry repository for one kind.
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn Connection,
    kind: EntryKind,
}

impl<'conn> SqliteEntryRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection, kind: EntryKind) -> RepoResult<Self> {
        ensure_tables(
            conn,
            &[kind.table(), kind.tag_link_table(), "categories", "tags"],
        )?;
        Ok(Self { conn, kind })
    }

    fn select_sql(&self) -> String {
        format!(
            "SELECT
                e.id,
                e.title,
                e.content,
                e.created_at,
                e.updated_at,
                e.author_id,
                u.email AS author_email,
                c.id AS category_id,
                c.title AS category_title,
                c.slug AS category_slug,
                c.created_at AS category_created_at,
                c.updated_at AS category_updated_at
             FROM {table} e
             INNER JOIN categories c ON c.id = e.category_id
             LEFT JOIN users u ON u.id = e.author_id",
            table = self.kind.table()
        )
    }

    fn query_page(
        &self,
        author: Option<UserId>,
        filters: &EntryFilters,
        page: PageRequest,
    ) -> RepoResult<Page<EntryRecord>> {
        let mut where_sql = String::from(" WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(author_id) = author {
            where_sql.push_str(" AND e.author_id = ?");
            bind_values.push(Value::Integer(author_id));
        }

        if let Some(category_id) = filters.category.as_ref().and_then(|c| c.id) {
            where_sql.push_str(" AND e.category_id = ?");
            bind_values.push(Value::Integer(category_id));
        }

        if let Some(tag_id) = filters.tag.as_ref().and_then(|t| t.id) {
            where_sql.push_str(&format!(
                " AND EXISTS (
                    SELECT 1
                    FROM {link} l
                    WHERE l.{column} = e.id
                      AND l.tag_id = ?
                )",
                link = self.kind.tag_link_table(),
                column = self.kind.link_column(),
            ));
            bind_values.push(Value::Integer(tag_id));
        }

        let total: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {table} e{where_sql};",
                table = self.kind.table()
            ),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )?;

        let sql = format!(
            "{select}{where_sql} ORDER BY e.updated_at DESC, e.id DESC LIMIT ? OFFSET ?;",
            select = self.select_sql()
        );
        bind_values.push(Value::Integer(i64::from(page.per_page)));
        bind_values.push(Value::Integer(offset_param(page)?));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(self.parse_record_row(row)?);
        }

        Ok(Page::new(items, page, count_to_u64(total)?))
    }

    fn parse_record_row(&self, row: &Row<'_>) -> RepoResult<EntryRecord> {
        let id: EntryId = row.get("id")?;
        let category = Category {
            id: Some(row.get("category_id")?),
            title: row.get("category_title")?,
            slug: row.get("category_slug")?,
            created_at: Some(row.get("category_created_at")?),
            updated_at: Some(row.get("category_updated_at")?),
        };
        let created_at: i64 = row.get("created_at")?;
        let updated_at: i64 = row.get("updated_at")?;
        if updated_at < created_at {
            return Err(RepoError::InvalidData(format!(
                "{} {id} has updated_at {updated_at} before created_at {created_at}",
                self.kind.as_str()
            )));
        }

        Ok(EntryRecord {
            id,
            kind: self.kind,
            title: row.get("title")?,
            content: row.get("content")?,
            category,
            tags: self.load_tags(id)?,
            author_id: row.get("author_id")?,
            author_email: row.get("author_email")?,
            created_at,
            updated_at,
        })
    }

    fn load_tags(&self, id: EntryId) -> RepoResult<Vec<Tag>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT t.id, t.title, t.slug, t.created_at, t.updated_at
             FROM {link} l
             INNER JOIN tags t ON t.id = l.tag_id
             WHERE l.{column} = ?1
             ORDER BY t.title ASC;",
            link = self.kind.tag_link_table(),
            column = self.kind.link_column(),
        ))?;
        let rows = stmt.query_map([id], parse_tag_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn ensure_kind(&self, entry: &Entry) -> RepoResult<()> {
        if entry.kind != self.kind {
            return Err(RepoError::InvalidData(format!(
                "{} repository cannot store a {}",
                self.kind.as_str(),
                entry.kind.as_str()
            )));
        }
        Ok(())
    }

    /// Upserts the row and replaces its tag links; returns
    /// `(id, created_at, updated_at)`.
    fn write_row(&self, entry: &Entry) -> RepoResult<(EntryId, i64, i64)> {
        let table = self.kind.table();
        let (id, created_at, updated_at): (EntryId, i64, i64) = match entry.id {
            None => self.conn.query_row(
                &format!(
                    "INSERT INTO {table}
                        (title, content, category_id, author_id, created_at, updated_at)
                     VALUES (
                        ?1, ?2, ?3, ?4,
                        COALESCE(?5, {NOW_MS_SQL}),
                        MAX(COALESCE(?6, {NOW_MS_SQL}), COALESCE(?5, {NOW_MS_SQL}))
                     )
                     RETURNING id, created_at, updated_at;"
                ),
                params![
                    entry.title,
                    entry.content,
                    entry.category_id,
                    entry.author_id,
                    entry.created_at,
                    entry.updated_at,
                ],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?,
            Some(id) => self
                .conn
                .query_row(
                    &format!(
                        "UPDATE {table}
                         SET
                            title = ?1,
                            content = ?2,
                            category_id = ?3,
                            author_id = ?4,
                            updated_at = MAX(created_at, {NOW_MS_SQL})
                         WHERE id = ?5
                         RETURNING id, created_at, updated_at;"
                    ),
                    params![
                        entry.title,
                        entry.content,
                        entry.category_id,
                        entry.author_id,
                        id
                    ],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?
                .ok_or(RepoError::NotFound {
                    entity: self.kind.as_str(),
                    id,
                })?,
        };

        let link = self.kind.tag_link_table();
        let column = self.kind.link_column();
        self.conn
            .execute(&format!("DELETE FROM {link} WHERE {column} = ?1;"), [id])?;
        for tag_id in &entry.tag_ids {
            self.conn.execute(
                &format!("INSERT INTO {link} ({column}, tag_id) VALUES (?1, ?2);"),
                params![id, tag_id],
            )?;
        }
        Ok((id, created_at, updated_at))
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn kind(&self) -> EntryKind {
        self.kind
    }

    fn query_all(
        &self,
        filters: &EntryFilters,
        page: PageRequest,
    ) -> RepoResult<Page<EntryRecord>> {
        self.query_page(None, filters, page)
    }

    fn query_by_author(
        &self,
        author: UserId,
        filters: &EntryFilters,
        page: PageRequest,
    ) -> RepoResult<Page<EntryRecord>> {
        self.query_page(Some(author), filters, page)
    }

    fn find_one_by_id(&self, id: EntryId) -> RepoResult<Option<EntryRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE e.id = ?1;", self.select_sql()))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(self.parse_record_row(row)?)),
            None => Ok(None),
        }
    }

    fn save(&self, entry: &mut Entry) -> RepoResult<EntryId> {
        self.ensure_kind(entry)?;
        let (id, created_at, updated_at) =
            with_savepoint(self.conn, "entry_save", || self.write_row(entry))?;

        entry.id = Some(id);
        entry.created_at = Some(created_at);
        entry.updated_at = Some(updated_at);
        Ok(id)
    }

    fn within_transaction<T, E>(&self, work: impl FnOnce() -> Result<T, E>) -> Result<T, E>
    where
        E: From<RepoError>,
    {
        with_savepoint(self.conn, "entry_unit", work)
    }

    fn delete(&self, id: EntryId) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1;", self.kind.table()),
            [id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: self.kind.as_str(),
                id,
            });
        }
        Ok(())
    }
}
