//! Domain records for users, tasks, notes, categories and tags.
//!
//! # Responsibility
//! - Define passive records mapped one-to-one onto relational tables.
//! - Provide constructor + setter style helpers used by forms and fixtures.
//!
//! # Invariants
//! - `id == None` means "not yet persisted"; repositories assign ids.
//! - Slugs and timestamps are owned by persistence, never set by callers.

pub mod category;
pub mod entry;
pub mod page;
pub mod slug;
pub mod tag;
pub mod user;
