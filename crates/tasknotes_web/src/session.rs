//! Session cookie, current-user extractors and flash messages.
//!
//! # Invariants
//! - The session cookie only ever carries the opaque token; the user is
//!   reloaded from storage on every request.
//! - A flash message is shown once: the page that renders it clears the
//!   cookie.

use crate::error::WebError;
use crate::state::AppState;
use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use serde::Serialize;
use tasknotes_core::repo::session_repo::{SqliteSessionRepository, SESSION_MAX_AGE_MS};
use tasknotes_core::repo::user_repo::SqliteUserRepository;
use tasknotes_core::service::auth_service::AuthService;
use tasknotes_core::{User, Viewer};

pub const SESSION_COOKIE: &str = "tasknotes_session";
pub const FLASH_COOKIE: &str = "tasknotes_flash";

/// Returns the value of cookie `name` from the request headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

pub fn session_cookie(token: &str) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_MAX_AGE_MS / 1000
    )
}

pub fn expired_cookie(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Signed-in user for the current request. Rejects with a redirect to
/// `/login` when there is no valid session.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub viewer: Viewer,
    pub token: String,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.viewer.is_admin()
    }
}

async fn load_current_user(
    parts: &Parts,
    state: &AppState,
) -> Result<Option<CurrentUser>, WebError> {
    let Some(token) = read_cookie(&parts.headers, SESSION_COOKIE) else {
        return Ok(None);
    };
    let lookup = token.clone();
    let user = state
        .with_db(move |conn, _| {
            let auth = AuthService::new(
                SqliteUserRepository::try_new(conn)?,
                SqliteSessionRepository::try_new(conn)?,
            );
            Ok(auth.current_user(&lookup)?)
        })
        .await?;

    Ok(user.and_then(|user| {
        let viewer = Viewer::from_user(&user)?;
        Some(CurrentUser {
            user,
            viewer,
            token,
        })
    }))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        load_current_user(parts, state)
            .await?
            .ok_or(WebError::Unauthenticated)
    }
}

impl OptionalFromRequestParts<AppState> for CurrentUser {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        load_current_user(parts, state).await
    }
}

/// Signed-in admin; other users get 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(parts, state)
            .await?;
        if !current.is_admin() {
            return Err(WebError::Forbidden);
        }
        Ok(Self(current))
    }
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashMessage {
    CreatedSuccessfully,
    EditedSuccessfully,
    DeletedSuccessfully,
    PasswordChanged,
    RegisteredSuccessfully,
    LoggedOut,
    CategoryInUse,
}

impl FlashMessage {
    const ALL: [FlashMessage; 7] = [
        Self::CreatedSuccessfully,
        Self::EditedSuccessfully,
        Self::DeletedSuccessfully,
        Self::PasswordChanged,
        Self::RegisteredSuccessfully,
        Self::LoggedOut,
        Self::CategoryInUse,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::CreatedSuccessfully => "created_successfully",
            Self::EditedSuccessfully => "edited_successfully",
            Self::DeletedSuccessfully => "deleted_successfully",
            Self::PasswordChanged => "password_changed",
            Self::RegisteredSuccessfully => "registered_successfully",
            Self::LoggedOut => "logged_out",
            Self::CategoryInUse => "category_in_use",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|message| message.key() == key)
    }

    /// Bootstrap-style alert level.
    pub fn level(self) -> &'static str {
        match self {
            Self::CategoryInUse => "warning",
            _ => "success",
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            Self::CreatedSuccessfully => "Created successfully.",
            Self::EditedSuccessfully => "Edited successfully.",
            Self::DeletedSuccessfully => "Deleted successfully.",
            Self::PasswordChanged => "Password changed.",
            Self::RegisteredSuccessfully => "Registered successfully. You can sign in now.",
            Self::LoggedOut => "You have been signed out.",
            Self::CategoryInUse => "This category still has tasks or notes and cannot be deleted.",
        }
    }
}

/// Template view of a pending flash message.
#[derive(Debug, Clone, Serialize)]
pub struct FlashView {
    pub level: &'static str,
    pub text: &'static str,
}

/// Flash message pending for this request, if any.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flash(pub Option<FlashMessage>);

impl Flash {
    pub fn view(&self) -> Option<FlashView> {
        self.0.map(|message| FlashView {
            level: message.level(),
            text: message.text(),
        })
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Flash {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            read_cookie(&parts.headers, FLASH_COOKIE).and_then(|key| FlashMessage::from_key(&key)),
        ))
    }
}

/// 303 redirect that leaves `message` for the next page.
pub fn redirect_with_flash(to: &str, message: FlashMessage) -> Response {
    (
        AppendHeaders([(
            SET_COOKIE,
            format!("{FLASH_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", message.key()),
        )]),
        Redirect::to(to),
    )
        .into_response()
}
