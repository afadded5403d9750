//! Task/note domain model.
//!
//! # Responsibility
//! - Define the one record shape shared by tasks and notes.
//! - Map each kind onto its own table and tag-link table.
//!
//! # Invariants
//! - `kind` never changes after construction; tasks and notes live in
//!   separate tables with separate id sequences.
//! - `author_id` is optional: entries outlive the user that wrote them.
//! - `updated_at >= created_at` once persisted.

use crate::model::category::{Category, CategoryId};
use crate::model::tag::{Tag, TagId};
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type EntryId = i64;

/// Which table an entry is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Task,
    Note,
}

impl EntryKind {
    pub fn table(self) -> &'static str {
        match self {
            Self::Task => "tasks",
            Self::Note => "notes",
        }
    }

    pub fn tag_link_table(self) -> &'static str {
        match self {
            Self::Task => "task_tags",
            Self::Note => "note_tags",
        }
    }

    /// Column in the link table referencing this kind's table.
    pub fn link_column(self) -> &'static str {
        match self {
            Self::Task => "task_id",
            Self::Note => "note_id",
        }
    }

    /// Route prefix and log label, e.g. `task`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Note => "note",
        }
    }
}

/// Writable task or note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: Option<EntryId>,
    pub kind: EntryKind,
    pub title: String,
    pub content: String,
    pub category_id: CategoryId,
    pub tag_ids: BTreeSet<TagId>,
    pub author_id: Option<UserId>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl Entry {
    /// Creates an unsaved entry without tags or author.
    pub fn new(
        kind: EntryKind,
        title: impl Into<String>,
        content: impl Into<String>,
        category_id: CategoryId,
    ) -> Self {
        Self {
            id: None,
            kind,
            title: title.into(),
            content: content.into(),
            category_id,
            tag_ids: BTreeSet::new(),
            author_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn set_tags(&mut self, tag_ids: impl IntoIterator<Item = TagId>) {
        self.tag_ids = tag_ids.into_iter().collect();
    }

    pub fn set_author(&mut self, author_id: Option<UserId>) {
        self.author_id = author_id;
    }
}

/// Read model for list/detail views: the entry plus resolved relations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryRecord {
    pub id: EntryId,
    pub kind: EntryKind,
    pub title: String,
    pub content: String,
    pub category: Category,
    /// Sorted by title.
    pub tags: Vec<Tag>,
    pub author_id: Option<UserId>,
    pub author_email: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl EntryRecord {
    /// Converts back into a writable entry, e.g. before applying an edit form.
    pub fn to_entry(&self) -> Entry {
        Entry {
            id: Some(self.id),
            kind: self.kind,
            title: self.title.clone(),
            content: self.content.clone(),
            category_id: self.category.id.unwrap_or_default(),
            tag_ids: self.tags.iter().filter_map(|tag| tag.id).collect(),
            author_id: self.author_id,
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        }
    }
}

/// Resolved list filters; unknown ids have already been dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilters {
    pub category: Option<Category>,
    pub tag: Option<Tag>,
}

/// Raw filter parameters as received from a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct EntryFilterParams {
    #[serde(default, deserialize_with = "crate::form::lenient_id")]
    pub category_id: Option<CategoryId>,
    #[serde(default, deserialize_with = "crate::form::lenient_id")]
    pub tag_id: Option<TagId>,
}
