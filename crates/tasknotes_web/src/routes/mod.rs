//! Route table and helpers shared by the controllers.
//!
//! # Invariants
//! - Record ids in paths match `[1-9][0-9]*`; anything else is 404.
//! - Every route answering PUT or DELETE also answers POST, since HTML
//!   forms cannot send the former.

use crate::error::{WebError, WebResult};
use crate::state::AppState;
use axum::response::Redirect;
use axum::routing::get;
use axum::{Extension, Router};
use serde::{Deserialize, Serialize};
use tasknotes_core::form::{empty_string_as_none, FormErrors};
use tasknotes_core::{EntryKind, Page, ServiceError, ServiceResult};

pub mod entries;
pub mod security;
pub mod taxonomy;
pub mod users;

use taxonomy::TaxonomyKind;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/task") }))
        .merge(security::routes())
        .merge(users::routes())
        .merge(entry_routes(EntryKind::Task))
        .merge(entry_routes(EntryKind::Note))
        .merge(taxonomy_routes(TaxonomyKind::Category))
        .merge(taxonomy_routes(TaxonomyKind::Tag))
}

fn entry_routes(kind: EntryKind) -> Router<AppState> {
    let base = format!("/{}", kind.as_str());
    Router::new()
        .route(&base, get(entries::index))
        .route(
            &format!("{base}/create"),
            get(entries::create_form).post(entries::create),
        )
        .route(&format!("{base}/{{id}}"), get(entries::show))
        .route(
            &format!("{base}/{{id}}/edit"),
            get(entries::edit_form)
                .put(entries::edit)
                .post(entries::edit),
        )
        .route(
            &format!("{base}/{{id}}/delete"),
            get(entries::delete_form)
                .delete(entries::delete)
                .post(entries::delete),
        )
        .layer(Extension(kind))
}

fn taxonomy_routes(kind: TaxonomyKind) -> Router<AppState> {
    let base = format!("/{}", kind.as_str());
    Router::new()
        .route(&base, get(taxonomy::index))
        .route(
            &format!("{base}/create"),
            get(taxonomy::create_form).post(taxonomy::create),
        )
        .route(&format!("{base}/{{id}}"), get(taxonomy::show))
        .route(
            &format!("{base}/{{id}}/edit"),
            get(taxonomy::edit_form)
                .put(taxonomy::edit)
                .post(taxonomy::edit),
        )
        .route(
            &format!("{base}/{{id}}/delete"),
            get(taxonomy::delete_form)
                .delete(taxonomy::delete)
                .post(taxonomy::delete),
        )
        .layer(Extension(kind))
}

/// Parses a path id, rejecting zero, signs and leading zeros with 404.
pub fn parse_id(raw: &str) -> WebResult<i64> {
    let mut chars = raw.chars();
    let valid = matches!(chars.next(), Some('1'..='9')) && chars.all(|c| c.is_ascii_digit());
    if !valid {
        return Err(WebError::NotFound);
    }
    raw.parse().map_err(|_| WebError::NotFound)
}

/// `?page=N`; blank or missing means the first page.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<u32>,
}

impl PageQuery {
    pub fn number(self) -> u32 {
        self.page.unwrap_or(1)
    }
}

/// Paginator shape handed to templates.
#[derive(Debug, Serialize)]
pub struct PaginationView<T: Serialize> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_count: u32,
    pub total_items: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T: Serialize> From<Page<T>> for PaginationView<T> {
    fn from(page: Page<T>) -> Self {
        let page_count = page.page_count();
        let has_previous = page.has_previous();
        let has_next = page.has_next();
        Self {
            page: page.page,
            total_items: page.total_items,
            items: page.items,
            page_count,
            has_previous,
            has_next,
        }
    }
}

/// Separates validation failures (re-render the form) from real errors.
pub fn form_outcome<T>(result: ServiceResult<T>) -> WebResult<Result<T, FormErrors>> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(ServiceError::Invalid(errors)) => Ok(Err(errors)),
        Err(other) => Err(other.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_id;

    #[test]
    fn parse_id_accepts_only_positive_canonical_numbers() {
        assert_eq!(parse_id("1").ok(), Some(1));
        assert_eq!(parse_id("42").ok(), Some(42));
        for raw in ["0", "007", "-3", "+3", "abc", "", "1e3", "99999999999999999999"] {
            assert!(parse_id(raw).is_err(), "{raw} should be rejected");
        }
    }
}
