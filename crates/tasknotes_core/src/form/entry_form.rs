//! Task/note form.
//!
//! Tags are typed as a comma-separated list of titles; the service turns
//! them into tag references, creating unknown tags on the fly.

use super::constraints::{length, not_blank};
use super::{empty_string_as_none, FormErrors};
use crate::model::category::CategoryId;
use crate::model::entry::{Entry, EntryRecord};
use crate::model::tag::TagId;
use serde::Deserialize;
use std::collections::BTreeSet;

const TITLE_MIN: usize = 3;
const TITLE_MAX: usize = 255;
const TAG_TITLE_MIN: usize = 3;
const TAG_TITLE_MAX: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EntryForm {
    pub title: String,
    pub content: String,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub category_id: Option<CategoryId>,
    /// Comma-separated tag titles.
    pub tags: String,
}

impl EntryForm {
    pub fn from_record(record: &EntryRecord) -> Self {
        Self {
            title: record.title.clone(),
            content: record.content.clone(),
            category_id: record.category.id,
            tags: record
                .tags
                .iter()
                .map(|tag| tag.title.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Distinct tag titles in input order; case-insensitive duplicates and
    /// blank items are dropped.
    pub fn tag_titles(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .filter(|title| seen.insert(title.to_lowercase()))
            .map(str::to_string)
            .collect()
    }

    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        errors.check("title", not_blank(&self.title));
        if !errors.has("title") {
            errors.check("title", length(&self.title, TITLE_MIN, TITLE_MAX));
        }
        if self.category_id.is_none() {
            errors.add("category_id", "Choose a category.");
        }
        for title in self.tag_titles() {
            if let Some(message) = length(&title, TAG_TITLE_MIN, TAG_TITLE_MAX) {
                errors.add("tags", format!("`{title}`: {message}"));
            }
        }
        errors
    }

    /// Binds validated scalar fields and the resolved tag ids onto `entry`.
    pub fn bind(&self, entry: &mut Entry, tag_ids: impl IntoIterator<Item = TagId>) {
        entry.title = self.title.trim().to_string();
        entry.content = self.content.clone();
        if let Some(category_id) = self.category_id {
            entry.category_id = category_id;
        }
        entry.set_tags(tag_ids);
    }
}
