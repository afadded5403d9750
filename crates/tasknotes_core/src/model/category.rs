//! Category model.

use serde::Serialize;

pub type CategoryId = i64;

/// Classification shared by tasks and notes. Every entry belongs to exactly
/// one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: Option<CategoryId>,
    pub title: String,
    /// Derived from `title` on every save.
    pub slug: String,
    /// Epoch milliseconds, set on insert.
    pub created_at: Option<i64>,
    /// Epoch milliseconds, refreshed on update.
    pub updated_at: Option<i64>,
}

impl Category {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            slug: String::new(),
            created_at: None,
            updated_at: None,
        }
    }
}
