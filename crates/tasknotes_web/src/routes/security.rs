//! Login, logout, registration and self-service account pages.

use super::form_outcome;
use crate::error::WebResult;
use crate::session::{
    expired_cookie, read_cookie, redirect_with_flash, session_cookie, CurrentUser, Flash,
    FlashMessage, SESSION_COOKIE,
};
use crate::state::{AppState, Page};
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;
use tasknotes_core::form::{AccountForm, FormErrors, RegistrationForm};
use tasknotes_core::repo::session_repo::SqliteSessionRepository;
use tasknotes_core::repo::user_repo::SqliteUserRepository;
use tasknotes_core::service::auth_service::AuthService;
use tasknotes_core::ServiceError;

const INVALID_CREDENTIALS: &str = "Invalid credentials.";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
        .route("/register", get(register_form).post(register))
        .route("/account", get(account_form).post(account).put(account))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

async fn login_form(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    flash: Flash,
) -> WebResult<Response> {
    if user.is_some() {
        return Ok(Redirect::to("/task").into_response());
    }
    state.render(
        "security/login.html",
        Page::new(None, flash).insert("last_username", ""),
    )
}

async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> WebResult<Response> {
    let email = form.email.clone();
    let outcome = state
        .with_db(move |conn, hasher| {
            let auth = AuthService::new(
                SqliteUserRepository::try_new(conn)?,
                SqliteSessionRepository::try_new(conn)?,
            );
            match auth.login(&form.email, &form.password, hasher) {
                Ok(session) => Ok(Some(session.token)),
                Err(ServiceError::InvalidCredentials) => Ok(None),
                Err(other) => Err(other.into()),
            }
        })
        .await?;

    match outcome {
        Some(token) => Ok((
            AppendHeaders([(SET_COOKIE, session_cookie(&token))]),
            Redirect::to("/task"),
        )
            .into_response()),
        None => state.render_with_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            "security/login.html",
            Page::new(None, Flash::default())
                .insert("last_username", &email)
                .insert("error", INVALID_CREDENTIALS),
        ),
    }
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> WebResult<Response> {
    if let Some(token) = read_cookie(&headers, SESSION_COOKIE) {
        state
            .with_db(move |conn, _| {
                let auth = AuthService::new(
                    SqliteUserRepository::try_new(conn)?,
                    SqliteSessionRepository::try_new(conn)?,
                );
                Ok(auth.logout(&token)?)
            })
            .await?;
    }
    let mut response = redirect_with_flash("/login", FlashMessage::LoggedOut);
    if let Ok(value) = expired_cookie(SESSION_COOKIE).parse() {
        response.headers_mut().append(SET_COOKIE, value);
    }
    Ok(response)
}

async fn register_form(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    flash: Flash,
) -> WebResult<Response> {
    render_register(
        &state,
        StatusCode::OK,
        user.as_ref(),
        flash,
        &RegistrationForm::default(),
        &FormErrors::new(),
    )
}

async fn register(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Form(form): Form<RegistrationForm>,
) -> WebResult<Response> {
    let submitted = form.clone();
    let outcome = state
        .with_db(move |conn, hasher| {
            let auth = AuthService::new(
                SqliteUserRepository::try_new(conn)?,
                SqliteSessionRepository::try_new(conn)?,
            );
            form_outcome(auth.register(&submitted, hasher))
        })
        .await?;

    match outcome {
        Ok(_) => Ok(redirect_with_flash(
            "/login",
            FlashMessage::RegisteredSuccessfully,
        )),
        Err(errors) => render_register(
            &state,
            StatusCode::UNPROCESSABLE_ENTITY,
            user.as_ref(),
            Flash::default(),
            &RegistrationForm {
                password: String::new(),
                ..form
            },
            &errors,
        ),
    }
}

fn render_register(
    state: &AppState,
    status: StatusCode,
    user: Option<&CurrentUser>,
    flash: Flash,
    form: &RegistrationForm,
    errors: &FormErrors,
) -> WebResult<Response> {
    state.render_with_status(
        status,
        "security/register.html",
        Page::new(user, flash)
            .insert("email", &form.email)
            .insert("name", &form.name)
            .insert("errors", errors),
    )
}

async fn account_form(
    State(state): State<AppState>,
    current: CurrentUser,
    flash: Flash,
) -> WebResult<Response> {
    let form = AccountForm::from_user(&current.user);
    render_account(&state, StatusCode::OK, &current, flash, &form, &FormErrors::new())
}

async fn account(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<AccountForm>,
) -> WebResult<Response> {
    let submitted = form.clone();
    let user_id = current.viewer.id;
    let outcome = state
        .with_db(move |conn, hasher| {
            let auth = AuthService::new(
                SqliteUserRepository::try_new(conn)?,
                SqliteSessionRepository::try_new(conn)?,
            );
            form_outcome(auth.update_account(user_id, &submitted, hasher))
        })
        .await?;

    match outcome {
        Ok(_) => Ok(redirect_with_flash("/task", FlashMessage::EditedSuccessfully)),
        Err(errors) => render_account(
            &state,
            StatusCode::UNPROCESSABLE_ENTITY,
            &current,
            Flash::default(),
            &form,
            &errors,
        ),
    }
}

fn render_account(
    state: &AppState,
    status: StatusCode,
    current: &CurrentUser,
    flash: Flash,
    form: &AccountForm,
    errors: &FormErrors,
) -> WebResult<Response> {
    state.render_with_status(
        status,
        "security/account.html",
        Page::new(Some(current), flash)
            .insert("email", &form.email)
            .insert("name", &form.name)
            .insert("errors", errors),
    )
}
