//! Admin user management plus per-user profile, edit and password pages.
//!
//! Listing and creating users is admin-only. The other pages go through the
//! user voter: admins may act on anyone, users only on themselves.

use super::{form_outcome, parse_id, PageQuery, PaginationView};
use crate::error::WebResult;
use crate::session::{
    expired_cookie, redirect_with_flash, AdminUser, CurrentUser, Flash, FlashMessage,
    SESSION_COOKIE,
};
use crate::state::{AppState, Page};
use axum::extract::{Path, Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::{Form, Router};
use serde::Serialize;
use tasknotes_core::form::{FormErrors, PasswordForm, UserForm};
use tasknotes_core::repo::user_repo::SqliteUserRepository;
use tasknotes_core::security::deny_access_unless_granted;
use tasknotes_core::service::user_service::UserService;
use tasknotes_core::{Permission, Subject, User, UserId, Viewer};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user", get(index))
        .route("/user/create", get(create_form).post(create))
        .route("/user/{id}", get(show))
        .route("/user/{id}/edit", get(edit_form).put(edit).post(edit))
        .route(
            "/user/{id}/delete",
            get(delete_form).delete(delete).post(delete),
        )
        .route(
            "/user/{id}/password",
            get(password_form).put(password).post(password),
        )
}

#[derive(Debug, Serialize)]
struct UserView {
    id: UserId,
    email: String,
    name: String,
    is_admin: bool,
    roles: Vec<&'static str>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id.unwrap_or_default(),
            is_admin: user.is_admin(),
            roles: user.roles().into_iter().map(|role| role.label()).collect(),
            email: user.email,
            name: user.name,
        }
    }
}

/// Loads user `id` after checking `permission` on it.
fn load_granted(
    conn: &rusqlite::Connection,
    viewer: &Viewer,
    permission: Permission,
    id: UserId,
) -> WebResult<User> {
    let service = UserService::new(SqliteUserRepository::try_new(conn)?);
    let user = service.get(id)?;
    deny_access_unless_granted(viewer, permission, Subject::User(id))?;
    Ok(user)
}

/// Where to go after changing user `id`: the list for admins, the profile
/// otherwise.
fn after_change(current: &CurrentUser, id: UserId) -> String {
    if current.is_admin() {
        "/user".to_string()
    } else {
        format!("/user/{id}")
    }
}

async fn index(
    State(state): State<AppState>,
    AdminUser(current): AdminUser,
    Query(query): Query<PageQuery>,
    flash: Flash,
) -> WebResult<Response> {
    let page = state
        .with_db(move |conn, _| {
            let service = UserService::new(SqliteUserRepository::try_new(conn)?);
            Ok(service.get_paginated_list(query.number())?)
        })
        .await?;
    let pagination = PaginationView::from(page.map(UserView::from));
    state.render(
        "user/index.html",
        Page::new(Some(&current), flash).insert("pagination", &pagination),
    )
}

async fn show(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(raw_id): Path<String>,
    flash: Flash,
) -> WebResult<Response> {
    let id = parse_id(&raw_id)?;
    let viewer = current.viewer.clone();
    let user = state
        .with_db(move |conn, _| load_granted(conn, &viewer, Permission::View, id))
        .await?;
    state.render(
        "user/show.html",
        Page::new(Some(&current), flash).insert("user", &UserView::from(user)),
    )
}

fn render_form(
    state: &AppState,
    status: StatusCode,
    current: &CurrentUser,
    target: Option<UserId>,
    form: &UserForm,
    errors: &FormErrors,
) -> WebResult<Response> {
    state.render_with_status(
        status,
        "user/form.html",
        Page::new(Some(current), Flash::default())
            .insert("target_id", &target)
            .insert("email", &form.email)
            .insert("name", &form.name)
            .insert("is_admin", &form.is_admin)
            .insert("errors", errors),
    )
}

async fn create_form(
    State(state): State<AppState>,
    AdminUser(current): AdminUser,
) -> WebResult<Response> {
    render_form(
        &state,
        StatusCode::OK,
        &current,
        None,
        &UserForm::default(),
        &FormErrors::new(),
    )
}

async fn create(
    State(state): State<AppState>,
    AdminUser(current): AdminUser,
    Form(form): Form<UserForm>,
) -> WebResult<Response> {
    let submitted = form.clone();
    let outcome = state
        .with_db(move |conn, hasher| {
            let service = UserService::new(SqliteUserRepository::try_new(conn)?);
            form_outcome(service.create_from_form(&submitted, hasher))
        })
        .await?;

    match outcome {
        Ok(_) => Ok(redirect_with_flash("/user", FlashMessage::CreatedSuccessfully)),
        Err(errors) => render_form(
            &state,
            StatusCode::UNPROCESSABLE_ENTITY,
            &current,
            None,
            &form,
            &errors,
        ),
    }
}

async fn edit_form(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(raw_id): Path<String>,
) -> WebResult<Response> {
    let id = parse_id(&raw_id)?;
    let viewer = current.viewer.clone();
    let user = state
        .with_db(move |conn, _| load_granted(conn, &viewer, Permission::Edit, id))
        .await?;
    render_form(
        &state,
        StatusCode::OK,
        &current,
        Some(id),
        &UserForm::from_user(&user),
        &FormErrors::new(),
    )
}

async fn edit(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(raw_id): Path<String>,
    Form(mut form): Form<UserForm>,
) -> WebResult<Response> {
    let id = parse_id(&raw_id)?;
    let viewer = current.viewer.clone();
    let submitted = form.clone();
    let outcome = state
        .with_db(move |conn, hasher| {
            let target = load_granted(conn, &viewer, Permission::Edit, id)?;
            let mut submitted = submitted;
            // Only admins hand out or revoke the admin role.
            if !viewer.is_admin() {
                submitted.is_admin = target.is_admin();
            }
            let service = UserService::new(SqliteUserRepository::try_new(conn)?);
            form_outcome(service.update_from_form(id, &submitted, hasher))
        })
        .await?;

    match outcome {
        Ok(_) => Ok(redirect_with_flash(
            &after_change(&current, id),
            FlashMessage::EditedSuccessfully,
        )),
        Err(errors) => {
            form.password = None;
            render_form(
                &state,
                StatusCode::UNPROCESSABLE_ENTITY,
                &current,
                Some(id),
                &form,
                &errors,
            )
        }
    }
}

async fn delete_form(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(raw_id): Path<String>,
) -> WebResult<Response> {
    let id = parse_id(&raw_id)?;
    let viewer = current.viewer.clone();
    let user = state
        .with_db(move |conn, _| load_granted(conn, &viewer, Permission::Delete, id))
        .await?;
    state.render(
        "user/delete.html",
        Page::new(Some(&current), Flash::default()).insert("user", &UserView::from(user)),
    )
}

async fn delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(raw_id): Path<String>,
) -> WebResult<Response> {
    let id = parse_id(&raw_id)?;
    let viewer = current.viewer.clone();
    state
        .with_db(move |conn, _| {
            load_granted(conn, &viewer, Permission::Delete, id)?;
            let service = UserService::new(SqliteUserRepository::try_new(conn)?);
            Ok(service.delete(id)?)
        })
        .await?;

    if id == current.viewer.id {
        let mut response = redirect_with_flash("/login", FlashMessage::DeletedSuccessfully);
        if let Ok(value) = expired_cookie(SESSION_COOKIE).parse() {
            response.headers_mut().append(SET_COOKIE, value);
        }
        return Ok(response);
    }
    Ok(redirect_with_flash("/user", FlashMessage::DeletedSuccessfully))
}

fn render_password(
    state: &AppState,
    status: StatusCode,
    current: &CurrentUser,
    user: &UserView,
    errors: &FormErrors,
) -> WebResult<Response> {
    state.render_with_status(
        status,
        "user/password.html",
        Page::new(Some(current), Flash::default())
            .insert("user", user)
            .insert("errors", errors),
    )
}

async fn password_form(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(raw_id): Path<String>,
) -> WebResult<Response> {
    let id = parse_id(&raw_id)?;
    let viewer = current.viewer.clone();
    let user = state
        .with_db(move |conn, _| load_granted(conn, &viewer, Permission::Edit, id))
        .await?;
    render_password(
        &state,
        StatusCode::OK,
        &current,
        &UserView::from(user),
        &FormErrors::new(),
    )
}

async fn password(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(raw_id): Path<String>,
    Form(form): Form<PasswordForm>,
) -> WebResult<Response> {
    let id = parse_id(&raw_id)?;
    let viewer = current.viewer.clone();
    let outcome = state
        .with_db(move |conn, hasher| {
            let target = load_granted(conn, &viewer, Permission::Edit, id)?;
            let service = UserService::new(SqliteUserRepository::try_new(conn)?);
            let outcome = form_outcome(service.change_password(id, &form, hasher))?;
            Ok(outcome.map_err(|errors| (target, errors)))
        })
        .await?;

    match outcome {
        Ok(_) => Ok(redirect_with_flash(
            &after_change(&current, id),
            FlashMessage::PasswordChanged,
        )),
        Err((target, errors)) => render_password(
            &state,
            StatusCode::UNPROCESSABLE_ENTITY,
            &current,
            &UserView::from(target),
            &errors,
        ),
    }
}
