//! Category repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `slug` is recomputed from `title` on every insert and update.
//! - Categories still referenced by tasks/notes cannot be deleted; the
//!   foreign key rejects it and callers are expected to check first.

use crate::db::NOW_MS_SQL;
use crate::model::category::{Category, CategoryId};
use crate::model::page::{Page, PageRequest};
use crate::model::slug::slugify;
use crate::repo::{count_to_u64, ensure_tables, offset_param, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const CATEGORY_SELECT_SQL: &str =
    "SELECT id, title, slug, created_at, updated_at FROM categories";

/// Repository interface for categories.
pub trait CategoryRepository {
    fn find_one_by_id(&self, id: CategoryId) -> RepoResult<Option<Category>>;
    /// Lists categories, most recently updated first.
    fn query_all(&self, page: PageRequest) -> RepoResult<Page<Category>>;
    /// All categories sorted by title; used by choice fields and fixtures.
    fn find_all(&self) -> RepoResult<Vec<Category>>;
    fn save(&self, category: &mut Category) -> RepoResult<CategoryId>;
    fn delete(&self, id: CategoryId) -> RepoResult<()>;
    /// Number of tasks plus notes filed under the category.
    fn count_entries(&self, id: CategoryId) -> RepoResult<u64>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["categories", "tasks", "notes"])?;
        Ok(Self { conn })
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn find_one_by_id(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        let category = self
            .conn
            .query_row(
                &format!("{CATEGORY_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_category_row,
            )
            .optional()?;
        Ok(category)
    }

    fn query_all(&self, page: PageRequest) -> RepoResult<Page<Category>> {
        let total: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM categories;", [], |row| row.get(0))?;
        let mut stmt = self.conn.prepare(&format!(
            "{CATEGORY_SELECT_SQL} ORDER BY updated_at DESC, id DESC LIMIT ?1 OFFSET ?2;"
        ))?;
        let rows = stmt.query_map(
            params![i64::from(page.per_page), offset_param(page)?],
            parse_category_row,
        )?;
        let items = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, page, count_to_u64(total)?))
    }

    fn find_all(&self) -> RepoResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CATEGORY_SELECT_SQL} ORDER BY title COLLATE NOCASE ASC, id ASC;"
        ))?;
        let rows = stmt.query_map([], parse_category_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn save(&self, category: &mut Category) -> RepoResult<CategoryId> {
        let slug = slugify(&category.title);
        let (id, created_at, updated_at): (CategoryId, i64, i64) = match category.id {
            None => self.conn.query_row(
                &format!(
                    "INSERT INTO categories (title, slug, created_at, updated_at)
                     VALUES (?1, ?2, {NOW_MS_SQL}, {NOW_MS_SQL})
                     RETURNING id, created_at, updated_at;"
                ),
                params![category.title, slug],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?,
            Some(id) => self
                .conn
                .query_row(
                    &format!(
                        "UPDATE categories
                         SET title = ?1, slug = ?2, updated_at = MAX(created_at, {NOW_MS_SQL})
                         WHERE id = ?3
                         RETURNING id, created_at, updated_at;"
                    ),
                    params![category.title, slug, id],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?
                .ok_or(RepoError::NotFound {
                    entity: "category",
                    id,
                })?,
        };

        category.id = Some(id);
        category.slug = slug;
        category.created_at = Some(created_at);
        category.updated_at = Some(updated_at);
        Ok(id)
    }

    fn delete(&self, id: CategoryId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM categories WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "category",
                id,
            });
        }
        Ok(())
    }

    fn count_entries(&self, id: CategoryId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT
                (SELECT COUNT(*) FROM tasks WHERE category_id = ?1)
                + (SELECT COUNT(*) FROM notes WHERE category_id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        count_to_u64(count)
    }
}

pub(crate) fn parse_category_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: Some(row.get("id")?),
        title: row.get("title")?,
        slug: row.get("slug")?,
        created_at: Some(row.get("created_at")?),
        updated_at: Some(row.get("updated_at")?),
    })
}
