//! Category and tag pages. Both are titled records with a slug, so one set
//! of handlers serves them, switching on [`TaxonomyKind`].
//!
//! Every handler asks the taxonomy voter first: viewing is open to every
//! signed-in user, changes are admin-only.

use super::{form_outcome, parse_id, PageQuery, PaginationView};
use crate::error::{WebError, WebResult};
use crate::session::{redirect_with_flash, CurrentUser, Flash, FlashMessage};
use crate::state::{AppState, Page};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::{Extension, Form};
use rusqlite::Connection;
use serde::Serialize;
use tasknotes_core::form::{FormErrors, TaxonomyForm};
use tasknotes_core::repo::category_repo::SqliteCategoryRepository;
use tasknotes_core::repo::tag_repo::SqliteTagRepository;
use tasknotes_core::security::{deny_access_unless_granted, Permission, Subject};
use tasknotes_core::service::category_service::CategoryService;
use tasknotes_core::service::tag_service::TagService;
use tasknotes_core::{Category, ServiceError, Tag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxonomyKind {
    Category,
    Tag,
}

impl TaxonomyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Tag => "tag",
        }
    }

    fn index_path(self) -> String {
        format!("/{}", self.as_str())
    }
}

#[derive(Debug, Serialize)]
struct TaxonomyView {
    id: i64,
    title: String,
    slug: String,
    created_at: Option<i64>,
    updated_at: Option<i64>,
}

impl From<Category> for TaxonomyView {
    fn from(category: Category) -> Self {
        Self {
            id: category.id.unwrap_or_default(),
            title: category.title,
            slug: category.slug,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

impl From<Tag> for TaxonomyView {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id.unwrap_or_default(),
            title: tag.title,
            slug: tag.slug,
            created_at: tag.created_at,
            updated_at: tag.updated_at,
        }
    }
}

fn authorize(current: &CurrentUser, permission: Permission) -> WebResult<()> {
    deny_access_unless_granted(&current.viewer, permission, Subject::Taxonomy)?;
    Ok(())
}

fn categories(conn: &Connection) -> WebResult<CategoryService<SqliteCategoryRepository<'_>>> {
    Ok(CategoryService::new(SqliteCategoryRepository::try_new(conn)?))
}

fn tags(conn: &Connection) -> WebResult<TagService<SqliteTagRepository<'_>>> {
    Ok(TagService::new(SqliteTagRepository::try_new(conn)?))
}

fn load(conn: &Connection, kind: TaxonomyKind, id: i64) -> WebResult<TaxonomyView> {
    let found = match kind {
        TaxonomyKind::Category => categories(conn)?
            .find_one_by_id(id)?
            .map(TaxonomyView::from),
        TaxonomyKind::Tag => tags(conn)?.find_one_by_id(id)?.map(TaxonomyView::from),
    };
    found.ok_or(WebError::NotFound)
}

fn list(
    conn: &Connection,
    kind: TaxonomyKind,
    page: u32,
) -> WebResult<PaginationView<TaxonomyView>> {
    let view = match kind {
        TaxonomyKind::Category => {
            let page = categories(conn)?.get_paginated_list(page)?;
            PaginationView::from(page.map(TaxonomyView::from))
        }
        TaxonomyKind::Tag => {
            let page = tags(conn)?.get_paginated_list(page)?;
            PaginationView::from(page.map(TaxonomyView::from))
        }
    };
    Ok(view)
}

/// Creates (`id == None`) or renames a record from the submitted form.
fn save(
    conn: &Connection,
    kind: TaxonomyKind,
    id: Option<i64>,
    form: &TaxonomyForm,
) -> WebResult<Result<i64, FormErrors>> {
    match kind {
        TaxonomyKind::Category => {
            let service = categories(conn)?;
            let mut category = match id {
                Some(id) => service.find_one_by_id(id)?.ok_or(WebError::NotFound)?,
                None => Category::new(""),
            };
            form_outcome(service.save_from_form(&mut category, form))
        }
        TaxonomyKind::Tag => {
            let service = tags(conn)?;
            let mut tag = match id {
                Some(id) => service.find_one_by_id(id)?.ok_or(WebError::NotFound)?,
                None => Tag::new(""),
            };
            form_outcome(service.save_from_form(&mut tag, form))
        }
    }
}

pub async fn index(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    current: CurrentUser,
    Query(query): Query<PageQuery>,
    flash: Flash,
) -> WebResult<Response> {
    authorize(&current, Permission::View)?;
    let pagination = state
        .with_db(move |conn, _| list(conn, kind, query.number()))
        .await?;
    state.render(
        "taxonomy/index.html",
        Page::new(Some(&current), flash)
            .insert("kind", kind.as_str())
            .insert("pagination", &pagination),
    )
}

pub async fn show(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    current: CurrentUser,
    Path(raw_id): Path<String>,
    flash: Flash,
) -> WebResult<Response> {
    authorize(&current, Permission::View)?;
    let id = parse_id(&raw_id)?;
    let record = state.with_db(move |conn, _| load(conn, kind, id)).await?;
    state.render(
        "taxonomy/show.html",
        Page::new(Some(&current), flash)
            .insert("kind", kind.as_str())
            .insert("record", &record),
    )
}

fn render_form(
    state: &AppState,
    status: StatusCode,
    current: &CurrentUser,
    kind: TaxonomyKind,
    target: Option<i64>,
    title: &str,
    errors: &FormErrors,
) -> WebResult<Response> {
    state.render_with_status(
        status,
        "taxonomy/form.html",
        Page::new(Some(current), Flash::default())
            .insert("kind", kind.as_str())
            .insert("target_id", &target)
            .insert("title", title)
            .insert("errors", errors),
    )
}

pub async fn create_form(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    current: CurrentUser,
) -> WebResult<Response> {
    authorize(&current, Permission::Edit)?;
    render_form(
        &state,
        StatusCode::OK,
        &current,
        kind,
        None,
        "",
        &FormErrors::new(),
    )
}

pub async fn create(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    current: CurrentUser,
    Form(form): Form<TaxonomyForm>,
) -> WebResult<Response> {
    authorize(&current, Permission::Edit)?;
    let submitted = form.clone();
    let outcome = state
        .with_db(move |conn, _| save(conn, kind, None, &submitted))
        .await?;
    match outcome {
        Ok(_) => Ok(redirect_with_flash(
            &kind.index_path(),
            FlashMessage::CreatedSuccessfully,
        )),
        Err(errors) => render_form(
            &state,
            StatusCode::UNPROCESSABLE_ENTITY,
            &current,
            kind,
            None,
            &form.title,
            &errors,
        ),
    }
}

pub async fn edit_form(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    current: CurrentUser,
    Path(raw_id): Path<String>,
) -> WebResult<Response> {
    authorize(&current, Permission::Edit)?;
    let id = parse_id(&raw_id)?;
    let record = state.with_db(move |conn, _| load(conn, kind, id)).await?;
    render_form(
        &state,
        StatusCode::OK,
        &current,
        kind,
        Some(id),
        &record.title,
        &FormErrors::new(),
    )
}

pub async fn edit(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    current: CurrentUser,
    Path(raw_id): Path<String>,
    Form(form): Form<TaxonomyForm>,
) -> WebResult<Response> {
    authorize(&current, Permission::Edit)?;
    let id = parse_id(&raw_id)?;
    let submitted = form.clone();
    let outcome = state
        .with_db(move |conn, _| save(conn, kind, Some(id), &submitted))
        .await?;
    match outcome {
        Ok(_) => Ok(redirect_with_flash(
            &kind.index_path(),
            FlashMessage::EditedSuccessfully,
        )),
        Err(errors) => render_form(
            &state,
            StatusCode::UNPROCESSABLE_ENTITY,
            &current,
            kind,
            Some(id),
            &form.title,
            &errors,
        ),
    }
}

pub async fn delete_form(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    current: CurrentUser,
    Path(raw_id): Path<String>,
) -> WebResult<Response> {
    authorize(&current, Permission::Delete)?;
    let id = parse_id(&raw_id)?;
    let (record, deletable) = state
        .with_db(move |conn, _| {
            let record = load(conn, kind, id)?;
            let deletable = match kind {
                TaxonomyKind::Category => categories(conn)?.can_be_deleted(id)?,
                TaxonomyKind::Tag => true,
            };
            Ok((record, deletable))
        })
        .await?;
    if !deletable {
        return Ok(redirect_with_flash(
            &kind.index_path(),
            FlashMessage::CategoryInUse,
        ));
    }
    state.render(
        "taxonomy/delete.html",
        Page::new(Some(&current), Flash::default())
            .insert("kind", kind.as_str())
            .insert("record", &record),
    )
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(kind): Extension<TaxonomyKind>,
    current: CurrentUser,
    Path(raw_id): Path<String>,
) -> WebResult<Response> {
    authorize(&current, Permission::Delete)?;
    let id = parse_id(&raw_id)?;
    let outcome = state
        .with_db(move |conn, _| {
            let result = match kind {
                TaxonomyKind::Category => categories(conn)?.delete(id),
                TaxonomyKind::Tag => tags(conn)?.delete(id),
            };
            match result {
                Ok(()) => Ok(FlashMessage::DeletedSuccessfully),
                Err(ServiceError::CategoryInUse(_)) => Ok(FlashMessage::CategoryInUse),
                Err(other) => Err(other.into()),
            }
        })
        .await?;
    Ok(redirect_with_flash(&kind.index_path(), outcome))
}
