#![allow(dead_code)]

use rusqlite::Connection;
use tasknotes_core::model::category::{Category, CategoryId};
use tasknotes_core::model::user::{Role, User};
use tasknotes_core::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use tasknotes_core::repo::entry_repo::SqliteEntryRepository;
use tasknotes_core::repo::tag_repo::SqliteTagRepository;
use tasknotes_core::repo::user_repo::{SqliteUserRepository, UserRepository};
use tasknotes_core::security::{Argon2PasswordHasher, PasswordHasher, Viewer};
use tasknotes_core::service::entry_service::EntryService;
use tasknotes_core::EntryKind;

pub type SqliteEntryService<'conn> = EntryService<
    SqliteEntryRepository<'conn>,
    SqliteCategoryRepository<'conn>,
    SqliteTagRepository<'conn>,
>;

pub fn hasher() -> Argon2PasswordHasher {
    Argon2PasswordHasher::low_cost()
}

/// Persists a user with `password` hashed and returns it with its viewer.
pub fn create_user(conn: &Connection, email: &str, password: &str, admin: bool) -> (User, Viewer) {
    let repo = SqliteUserRepository::try_new(conn).unwrap();
    let mut user = User::new(email, email.split('@').next().unwrap_or(email));
    if admin {
        user.set_roles([Role::User, Role::Admin]);
    }
    user.password = hasher().hash_password(password).unwrap();
    repo.save(&mut user).unwrap();
    let viewer = Viewer::from_user(&user).unwrap();
    (user, viewer)
}

pub fn create_category(conn: &Connection, title: &str) -> CategoryId {
    let repo = SqliteCategoryRepository::try_new(conn).unwrap();
    let mut category = Category::new(title);
    repo.save(&mut category).unwrap()
}

pub fn entry_service(conn: &Connection, kind: EntryKind) -> SqliteEntryService<'_> {
    EntryService::new(
        SqliteEntryRepository::try_new(conn, kind).unwrap(),
        SqliteCategoryRepository::try_new(conn).unwrap(),
        SqliteTagRepository::try_new(conn).unwrap(),
    )
}
