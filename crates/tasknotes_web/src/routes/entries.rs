//! Task and note pages. One set of handlers serves both kinds; the kind
//! arrives as a route extension.

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
use tasknotes_core::form::{EntryForm, FormErrors};
use tasknotes_core::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use tasknotes_core::repo::entry_repo::SqliteEntryRepository;
use tasknotes_core::repo::tag_repo::{SqliteTagRepository, TagRepository};
use tasknotes_core::security::deny_access_unless_granted;
use tasknotes_core::service::entry_service::EntryService;
use tasknotes_core::{
    Category, EntryFilterParams, EntryId, EntryKind, EntryRecord, Permission, Subject, Viewer,
};

type SqliteEntryService<'conn> = EntryService<
    SqliteEntryRepository<'conn>,
    SqliteCategoryRepository<'conn>,
    SqliteTagRepository<'conn>,
>;

fn entry_service(conn: &Connection, kind: EntryKind) -> WebResult<SqliteEntryService<'_>> {
    Ok(EntryService::new(
        SqliteEntryRepository::try_new(conn, kind)?,
        SqliteCategoryRepository::try_new(conn)?,
        SqliteTagRepository::try_new(conn)?,
    ))
}

fn load_granted(
    service: &SqliteEntryService<'_>,
    viewer: &Viewer,
    permission: Permission,
    id: EntryId,
) -> WebResult<EntryRecord> {
    let record = service
        .find_one_by_id(id)?
        .ok_or(WebError::NotFound)?;
    deny_access_unless_granted(
        viewer,
        permission,
        Subject::Entry {
            author_id: record.author_id,
        },
    )?;
    Ok(record)
}

fn all_categories(conn: &Connection) -> WebResult<Vec<Category>> {
    Ok(SqliteCategoryRepository::try_new(conn)?.find_all()?)
}

pub async fn index(
    State(state): State<AppState>,
    Extension(kind): Extension<EntryKind>,
    current: CurrentUser,
    Query(query): Query<PageQuery>,
    Query(filters): Query<EntryFilterParams>,
    flash: Flash,
) -> WebResult<Response> {
    let viewer = current.viewer.clone();
    let (page, categories, tags) = state
        .with_db(move |conn, _| {
            let service = entry_service(conn, kind)?;
            let page = service.get_paginated_list(query.number(), &viewer, filters)?;
            let tags = SqliteTagRepository::try_new(conn)?.find_all()?;
            Ok((page, all_categories(conn)?, tags))
        })
        .await?;

    state.render(
        "entry/index.html",
        Page::new(Some(&current), flash)
            .insert("kind", kind.as_str())
            .insert("pagination", &PaginationView::from(page))
            .insert("categories", &categories)
            .insert("tags", &tags)
            .insert("filter_category_id", &filters.category_id)
            .insert("filter_tag_id", &filters.tag_id),
    )
}

pub async fn show(
    State(state): State<AppState>,
    Extension(kind): Extension<EntryKind>,
    current: CurrentUser,
    Path(raw_id): Path<String>,
    flash: Flash,
) -> WebResult<Response> {
    let id = parse_id(&raw_id)?;
    let viewer = current.viewer.clone();
    let record = state
        .with_db(move |conn, _| {
            load_granted(&entry_service(conn, kind)?, &viewer, Permission::View, id)
        })
        .await?;
    state.render(
        "entry/show.html",
        Page::new(Some(&current), flash)
            .insert("kind", kind.as_str())
            .insert("entry", &record),
    )
}

#[allow(clippy::too_many_arguments)]
fn render_form(
    state: &AppState,
    status: StatusCode,
    current: &CurrentUser,
    kind: EntryKind,
    target: Option<EntryId>,
    form: &EntryForm,
    categories: &[Category],
    errors: &FormErrors,
) -> WebResult<Response> {
    state.render_with_status(
        status,
        "entry/form.html",
        Page::new(Some(current), Flash::default())
            .insert("kind", kind.as_str())
            .insert("target_id", &target)
            .insert("form", &FormView::from(form))
            .insert("categories", categories)
            .insert("errors", errors),
    )
}

/// `EntryForm` as the template sees it.
#[derive(Serialize)]
struct FormView<'a> {
    title: &'a str,
    content: &'a str,
    category_id: Option<i64>,
    tags: &'a str,
}

impl<'a> From<&'a EntryForm> for FormView<'a> {
    fn from(form: &'a EntryForm) -> Self {
        Self {
            title: &form.title,
            content: &form.content,
            category_id: form.category_id,
            tags: &form.tags,
        }
    }
}

pub async fn create_form(
    State(state): State<AppState>,
    Extension(kind): Extension<EntryKind>,
    current: CurrentUser,
) -> WebResult<Response> {
    let categories = state.with_db(|conn, _| all_categories(conn)).await?;
    render_form(
        &state,
        StatusCode::OK,
        &current,
        kind,
        None,
        &EntryForm::default(),
        &categories,
        &FormErrors::new(),
    )
}

pub async fn create(
    State(state): State<AppState>,
    Extension(kind): Extension<EntryKind>,
    current: CurrentUser,
    Form(form): Form<EntryForm>,
) -> WebResult<Response> {
    let viewer = current.viewer.clone();
    let submitted = form.clone();
    let (outcome, categories) = state
        .with_db(move |conn, _| {
            let service = entry_service(conn, kind)?;
            let outcome = form_outcome(service.create_from_form(&viewer, &submitted))?;
            Ok((outcome, all_categories(conn)?))
        })
        .await?;

    match outcome {
        Ok(_) => Ok(redirect_with_flash(
            &format!("/{}", kind.as_str()),
            FlashMessage::CreatedSuccessfully,
        )),
        Err(errors) => render_form(
            &state,
            StatusCode::UNPROCESSABLE_ENTITY,
            &current,
            kind,
            None,
            &form,
            &categories,
            &errors,
        ),
    }
}

pub async fn edit_form(
    State(state): State<AppState>,
    Extension(kind): Extension<EntryKind>,
    current: CurrentUser,
    Path(raw_id): Path<String>,
) -> WebResult<Response> {
    let id = parse_id(&raw_id)?;
    let viewer = current.viewer.clone();
    let (record, categories) = state
        .with_db(move |conn, _| {
            let record = load_granted(&entry_service(conn, kind)?, &viewer, Permission::Edit, id)?;
            Ok((record, all_categories(conn)?))
        })
        .await?;
    render_form(
        &state,
        StatusCode::OK,
        &current,
        kind,
        Some(id),
        &EntryForm::from_record(&record),
        &categories,
        &FormErrors::new(),
    )
}

pub async fn edit(
    State(state): State<AppState>,
    Extension(kind): Extension<EntryKind>,
    current: CurrentUser,
    Path(raw_id): Path<String>,
    Form(form): Form<EntryForm>,
) -> WebResult<Response> {
    let id = parse_id(&raw_id)?;
    let viewer = current.viewer.clone();
    let submitted = form.clone();
    let (outcome, categories) = state
        .with_db(move |conn, _| {
            let service = entry_service(conn, kind)?;
            let record = load_granted(&service, &viewer, Permission::Edit, id)?;
            let outcome = form_outcome(service.update_from_form(&record, &submitted))?;
            Ok((outcome, all_categories(conn)?))
        })
        .await?;

    match outcome {
        Ok(_) => Ok(redirect_with_flash(
            &format!("/{}", kind.as_str()),
            FlashMessage::EditedSuccessfully,
        )),
        Err(errors) => render_form(
            &state,
            StatusCode::UNPROCESSABLE_ENTITY,
            &current,
            kind,
            Some(id),
            &form,
            &categories,
            &errors,
        ),
    }
}

pub async fn delete_form(
    State(state): State<AppState>,
    Extension(kind): Extension<EntryKind>,
    current: CurrentUser,
    Path(raw_id): Path<String>,
) -> WebResult<Response> {
    let id = parse_id(&raw_id)?;
    let viewer = current.viewer.clone();
    let record = state
        .with_db(move |conn, _| {
            load_granted(&entry_service(conn, kind)?, &viewer, Permission::Delete, id)
        })
        .await?;
    state.render(
        "entry/delete.html",
        Page::new(Some(&current), Flash::default())
            .insert("kind", kind.as_str())
            .insert("entry", &record),
    )
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(kind): Extension<EntryKind>,
    current: CurrentUser,
    Path(raw_id): Path<String>,
) -> WebResult<Response> {
    let id = parse_id(&raw_id)?;
    let viewer = current.viewer.clone();
    state
        .with_db(move |conn, _| {
            let service = entry_service(conn, kind)?;
            load_granted(&service, &viewer, Permission::Delete, id)?;
            Ok(service.delete(id)?)
        })
        .await?;
    Ok(redirect_with_flash(
        &format!("/{}", kind.as_str()),
        FlashMessage::DeletedSuccessfully,
    ))
}
