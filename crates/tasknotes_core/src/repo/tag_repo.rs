//! Tag repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Tag titles are unique (`uq_tags_title`, case-insensitive); violating
//!   writes surface as `RepoError::Duplicate`.
//! - `slug` is recomputed from `title` on every insert and update.
//! - Deleting a tag removes its task/note links, not the entries.

use crate::db::NOW_MS_SQL;
use crate::model::page::{Page, PageRequest};
use crate::model::slug::slugify;
use crate::model::tag::{Tag, TagId};
use crate::repo::{
    count_to_u64, ensure_tables, map_unique_violation, offset_param, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const TAG_SELECT_SQL: &str = "SELECT id, title, slug, created_at, updated_at FROM tags";

/// Repository interface for tags.
pub trait TagRepository {
    fn find_one_by_id(&self, id: TagId) -> RepoResult<Option<Tag>>;
    /// Case-insensitive exact title lookup.
    fn find_one_by_title(&self, title: &str) -> RepoResult<Option<Tag>>;
    /// Lists tags, most recently updated first.
    fn query_all(&self, page: PageRequest) -> RepoResult<Page<Tag>>;
    /// All tags sorted by title.
    fn find_all(&self) -> RepoResult<Vec<Tag>>;
    fn save(&self, tag: &mut Tag) -> RepoResult<TagId>;
    fn delete(&self, id: TagId) -> RepoResult<()>;
}

/// SQLite-backed tag repository.
pub struct SqliteTagRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTagRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["tags"])?;
        Ok(Self { conn })
    }
}

impl TagRepository for SqliteTagRepository<'_> {
    fn find_one_by_id(&self, id: TagId) -> RepoResult<Option<Tag>> {
        let tag = self
            .conn
            .query_row(
                &format!("{TAG_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_tag_row,
            )
            .optional()?;
        Ok(tag)
    }

    fn find_one_by_title(&self, title: &str) -> RepoResult<Option<Tag>> {
        let tag = self
            .conn
            .query_row(
                &format!("{TAG_SELECT_SQL} WHERE title = ?1;"),
                [title.trim()],
                parse_tag_row,
            )
            .optional()?;
        Ok(tag)
    }

    fn query_all(&self, page: PageRequest) -> RepoResult<Page<Tag>> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tags;", [], |row| row.get(0))?;
        let mut stmt = self.conn.prepare(&format!(
            "{TAG_SELECT_SQL} ORDER BY updated_at DESC, id DESC LIMIT ?1 OFFSET ?2;"
        ))?;
        let rows = stmt.query_map(
            params![i64::from(page.per_page), offset_param(page)?],
            parse_tag_row,
        )?;
        let items = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, page, count_to_u64(total)?))
    }

    fn find_all(&self) -> RepoResult<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TAG_SELECT_SQL} ORDER BY title ASC, id ASC;"))?;
        let rows = stmt.query_map([], parse_tag_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn save(&self, tag: &mut Tag) -> RepoResult<TagId> {
        let title = tag.title.trim().to_string();
        let slug = slugify(&title);
        let (id, created_at, updated_at): (TagId, i64, i64) = match tag.id {
            None => self
                .conn
                .query_row(
                    &format!(
                        "INSERT INTO tags (title, slug, created_at, updated_at)
                         VALUES (?1, ?2, {NOW_MS_SQL}, {NOW_MS_SQL})
                         RETURNING id, created_at, updated_at;"
                    ),
                    params![title, slug],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .map_err(|err| map_unique_violation(err, "tag", "title"))?,
            Some(id) => self
                .conn
                .query_row(
                    &format!(
                        "UPDATE tags
                         SET title = ?1, slug = ?2, updated_at = MAX(created_at, {NOW_MS_SQL})
                         WHERE id = ?3
                         RETURNING id, created_at, updated_at;"
                    ),
                    params![title, slug, id],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()
                .map_err(|err| map_unique_violation(err, "tag", "title"))?
                .ok_or(RepoError::NotFound { entity: "tag", id })?,
        };

        tag.id = Some(id);
        tag.title = title;
        tag.slug = slug;
        tag.created_at = Some(created_at);
        tag.updated_at = Some(updated_at);
        Ok(id)
    }

    fn delete(&self, id: TagId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM tags WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "tag", id });
        }
        Ok(())
    }
}

pub(crate) fn parse_tag_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: Some(row.get("id")?),
        title: row.get("title")?,
        slug: row.get("slug")?,
        created_at: Some(row.get("created_at")?),
        updated_at: Some(row.get("updated_at")?),
    })
}
