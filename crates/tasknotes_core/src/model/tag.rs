//! Tag model.
//!
//! # Invariants
//! - `title` is unique across all tags (case-insensitive).

use serde::Serialize;

pub type TagId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: Option<TagId>,
    pub title: String,
    /// Derived from `title` on every save.
    pub slug: String,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Tag {
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
