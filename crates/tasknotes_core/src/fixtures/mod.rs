//! Demo data seeding.
//!
//! # Responsibility
//! - Populate a freshly migrated database with users, taxonomy and entries.
//! - Keep every random choice behind an injectable `Rng`.
//!
//! # Invariants
//! - Entry timestamps fall between 100 and 1 days ago, `updated_at >= created_at`.
//! - Tag titles are unique, matching the `tags` unique index.
//! - Entry authors are drawn from the regular (non-admin) accounts.

use crate::model::category::{Category, CategoryId};
use crate::model::entry::{Entry, EntryKind};
use crate::model::tag::{Tag, TagId};
use crate::model::user::{Role, User, UserId};
use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use crate::repo::entry_repo::{EntryRepository, SqliteEntryRepository};
use crate::repo::tag_repo::{SqliteTagRepository, TagRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::{RepoError, RepoResult};
use crate::security::PasswordHasher;
use log::info;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

mod words;

pub const USER_COUNT: usize = 10;
pub const ADMIN_COUNT: usize = 3;
pub const CATEGORY_COUNT: usize = 20;
pub const TAG_COUNT: usize = 30;
pub const TASK_COUNT: usize = 100;
pub const NOTE_COUNT: usize = 100;

pub const USER_PASSWORD: &str = "user1234";
pub const ADMIN_PASSWORD: &str = "admin1234";

const MAX_TAGS_PER_ENTRY: usize = 5;
const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Row counts written by [`load_fixtures`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixtureSummary {
    pub users: usize,
    pub admins: usize,
    pub categories: usize,
    pub tags: usize,
    pub tasks: usize,
    pub notes: usize,
}

#[derive(Debug)]
pub enum FixtureError {
    Repo(RepoError),
    Hashing(String),
}

impl Display for FixtureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Hashing(message) => write!(f, "password hashing failed: {message}"),
        }
    }
}

impl Error for FixtureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Hashing(_) => None,
        }
    }
}

impl From<RepoError> for FixtureError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Seeds demo data into a migrated connection.
pub fn load_fixtures<R: Rng + ?Sized>(
    conn: &Connection,
    hasher: &dyn PasswordHasher,
    rng: &mut R,
) -> Result<FixtureSummary, FixtureError> {
    let users = SqliteUserRepository::try_new(conn)?;
    let categories = SqliteCategoryRepository::try_new(conn)?;
    let tags = SqliteTagRepository::try_new(conn)?;

    let authors = seed_users(&users, hasher, "user", USER_COUNT, USER_PASSWORD, &[Role::User])?;
    let admins = seed_users(
        &users,
        hasher,
        "admin",
        ADMIN_COUNT,
        ADMIN_PASSWORD,
        &[Role::User, Role::Admin],
    )?;
    let category_ids = seed_categories(&categories, rng)?;
    let tag_ids = seed_tags(&tags, rng)?;

    let now_ms = now_ms();
    let tasks = seed_entries(
        conn,
        EntryKind::Task,
        TASK_COUNT,
        &category_ids,
        &tag_ids,
        &authors,
        now_ms,
        rng,
    )?;
    let notes = seed_entries(
        conn,
        EntryKind::Note,
        NOTE_COUNT,
        &category_ids,
        &tag_ids,
        &authors,
        now_ms,
        rng,
    )?;

    let summary = FixtureSummary {
        users: authors.len(),
        admins: admins.len(),
        categories: category_ids.len(),
        tags: tag_ids.len(),
        tasks,
        notes,
    };
    info!(
        "event=fixtures_load module=fixtures status=ok users={} admins={} categories={} \
         tags={} tasks={} notes={}",
        summary.users,
        summary.admins,
        summary.categories,
        summary.tags,
        summary.tasks,
        summary.notes
    );
    Ok(summary)
}

fn seed_users<U: UserRepository>(
    repo: &U,
    hasher: &dyn PasswordHasher,
    prefix: &str,
    count: usize,
    password: &str,
    roles: &[Role],
) -> Result<Vec<UserId>, FixtureError> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let mut user = User::new(format!("{prefix}{i}@example.com"), format!("{prefix}{i}"));
        user.set_roles(roles.iter().copied());
        user.password = hasher
            .hash_password(password)
            .map_err(|err| FixtureError::Hashing(err.to_string()))?;
        ids.push(repo.save(&mut user)?);
    }
    Ok(ids)
}

fn seed_categories<C: CategoryRepository, R: Rng + ?Sized>(
    repo: &C,
    rng: &mut R,
) -> RepoResult<Vec<CategoryId>> {
    let mut ids = Vec::with_capacity(CATEGORY_COUNT);
    for _ in 0..CATEGORY_COUNT {
        let mut category = Category::new(words::title(rng, 1, 3));
        ids.push(repo.save(&mut category)?);
    }
    Ok(ids)
}

fn seed_tags<T: TagRepository, R: Rng + ?Sized>(repo: &T, rng: &mut R) -> RepoResult<Vec<TagId>> {
    let mut titles: Vec<&str> = words::WORDS.iter().copied().filter(|w| w.len() >= 3).collect();
    titles.shuffle(rng);
    let mut ids = Vec::with_capacity(TAG_COUNT);
    for title in titles.into_iter().take(TAG_COUNT) {
        let mut tag = Tag::new(title);
        ids.push(repo.save(&mut tag)?);
    }
    Ok(ids)
}

#[allow(clippy::too_many_arguments)]
fn seed_entries<R: Rng + ?Sized>(
    conn: &Connection,
    kind: EntryKind,
    count: usize,
    categories: &[CategoryId],
    tags: &[TagId],
    authors: &[UserId],
    now_ms: i64,
    rng: &mut R,
) -> RepoResult<usize> {
    let repo = SqliteEntryRepository::try_new(conn, kind)?;
    for _ in 0..count {
        let mut entry = random_entry(kind, categories, tags, authors, now_ms, rng)?;
        repo.save(&mut entry)?;
    }
    Ok(count)
}

fn random_entry<R: Rng + ?Sized>(
    kind: EntryKind,
    categories: &[CategoryId],
    tags: &[TagId],
    authors: &[UserId],
    now_ms: i64,
    rng: &mut R,
) -> RepoResult<Entry> {
    let category_id = *categories
        .choose(rng)
        .ok_or_else(|| RepoError::InvalidData("no categories to pick from".to_string()))?;
    let mut entry = Entry::new(
        kind,
        words::sentence(rng),
        words::paragraph(rng),
        category_id,
    );

    let tag_count = rng.random_range(0..=MAX_TAGS_PER_ENTRY).min(tags.len());
    entry.set_tags(tags.choose_multiple(rng, tag_count).copied());
    entry.set_author(authors.choose(rng).copied());

    let oldest = now_ms - 100 * DAY_MS;
    let newest = now_ms - DAY_MS;
    let created_at = rng.random_range(oldest..=newest);
    let updated_at = rng.random_range(created_at..=newest);
    entry.created_at = Some(created_at);
    entry.updated_at = Some(updated_at);
    Ok(entry)
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::random_entry;
    use crate::model::entry::EntryKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn random_entry_stays_inside_the_seed_window() {
        let mut rng = StdRng::seed_from_u64(7);
        let now = 1_700_000_000_000;
        for _ in 0..50 {
            let entry =
                random_entry(EntryKind::Note, &[1, 2], &[1, 2, 3, 4, 5, 6], &[9], now, &mut rng)
                    .expect("entry should build");
            let created = entry.created_at.expect("created_at preset");
            let updated = entry.updated_at.expect("updated_at preset");
            assert!(created >= now - 100 * super::DAY_MS);
            assert!(updated <= now - super::DAY_MS);
            assert!(updated >= created);
            assert!(entry.tag_ids.len() <= 5);
            assert_eq!(entry.author_id, Some(9));
        }
    }

    #[test]
    fn random_entry_requires_categories() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(random_entry(EntryKind::Task, &[], &[], &[], 0, &mut rng).is_err());
    }
}
