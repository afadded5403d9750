//! Category and tag forms. Both carry a single title; slugs are derived on
//! save.

use super::constraints::{length, not_blank};
use super::FormErrors;
use serde::Deserialize;

const TITLE_MIN: usize = 3;
const TITLE_MAX: usize = 64;

/// Title form shared by categories and tags.
///
/// For tags, uniqueness of the title is checked by `TagService::save`,
/// which needs storage access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TaxonomyForm {
    pub title: String,
}

impl TaxonomyForm {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        errors.check("title", not_blank(&self.title));
        if !errors.has("title") {
            errors.check("title", length(&self.title, TITLE_MIN, TITLE_MAX));
        }
        errors
    }
}

pub type CategoryForm = TaxonomyForm;
pub type TagForm = TaxonomyForm;
