//! Core domain logic for the task and note manager.
//! This crate is the single source of truth for business invariants;
//! the HTTP and CLI crates only translate requests into service calls.

pub mod db;
pub mod fixtures;
pub mod form;
pub mod logging;
pub mod model;
pub mod repo;
pub mod security;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use fixtures::{load_fixtures, FixtureError, FixtureSummary};
pub use form::{FormError, FormErrors};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::category::{Category, CategoryId};
pub use model::entry::{Entry, EntryFilterParams, EntryId, EntryKind, EntryRecord};
pub use model::page::{Page, PageRequest, PAGINATOR_ITEMS_PER_PAGE};
pub use model::tag::{Tag, TagId};
pub use model::user::{Role, User, UserId};
pub use repo::{RepoError, RepoResult};
pub use security::{Argon2PasswordHasher, PasswordHasher, Permission, Subject, Viewer};
pub use service::{ServiceError, ServiceResult};

/// Minimal health-check API used by `tasknotes ping`.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
