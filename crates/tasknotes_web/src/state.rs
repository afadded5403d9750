//! Shared application state and the per-request database bridge.
//!
//! # Responsibility
//! - Own the database path, compiled templates and password hasher.
//! - Run storage work on the blocking pool with a fresh connection.
//! - Render pages with the layout context every template expects.
//!
//! # Invariants
//! - Connections never cross requests; each `with_db` call opens its own.
//! - Rendering a pending flash message also expires its cookie.

use crate::error::{WebError, WebResult};
use crate::session::{expired_cookie, CurrentUser, Flash, FLASH_COOKIE};
use crate::templates::build_templates;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use rusqlite::Connection;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tasknotes_core::db::open_db;
use tasknotes_core::security::PasswordHasher;
use tera::{Context, Tera};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<StateInner>,
}

struct StateInner {
    db_path: PathBuf,
    templates: Tera,
    hasher: Box<dyn PasswordHasher>,
}

impl AppState {
    /// Opens (and migrates) the database once, then compiles templates.
    pub fn new(
        db_path: impl Into<PathBuf>,
        hasher: impl PasswordHasher + 'static,
    ) -> WebResult<Self> {
        let db_path = db_path.into();
        drop(open_db(&db_path)?);
        Ok(Self {
            inner: Arc::new(StateInner {
                db_path,
                templates: build_templates()?,
                hasher: Box::new(hasher),
            }),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.inner.db_path
    }

    /// Runs `work` on the blocking pool against a fresh connection.
    pub async fn with_db<T, F>(&self, work: F) -> WebResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &dyn PasswordHasher) -> WebResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let conn = open_db(&inner.db_path)?;
            work(&conn, inner.hasher.as_ref())
        })
        .await
        .map_err(|err| WebError::Worker(err.to_string()))?
    }

    /// Renders `template` with 200.
    pub fn render(&self, template: &str, page: Page<'_>) -> WebResult<Response> {
        self.render_with_status(StatusCode::OK, template, page)
    }

    pub fn render_with_status(
        &self,
        status: StatusCode,
        template: &str,
        page: Page<'_>,
    ) -> WebResult<Response> {
        let Page {
            mut context,
            user,
            flash,
        } = page;
        context.insert("app_user", &user.map(LayoutUser::from));
        context.insert("flash", &flash.view());
        let html = self.inner.templates.render(template, &context)?;

        let mut response = (status, Html(html)).into_response();
        if flash.0.is_some() {
            if let Ok(value) = expired_cookie(FLASH_COOKIE).parse() {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        Ok(response)
    }
}

/// Template context plus the layout inputs (signed-in user, flash).
pub struct Page<'a> {
    context: Context,
    user: Option<&'a CurrentUser>,
    flash: Flash,
}

impl<'a> Page<'a> {
    pub fn new(user: Option<&'a CurrentUser>, flash: Flash) -> Self {
        Self {
            context: Context::new(),
            user,
            flash,
        }
    }

    pub fn insert<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Self {
        self.context.insert(key, value);
        self
    }
}

#[derive(Serialize)]
struct LayoutUser<'a> {
    id: i64,
    email: &'a str,
    is_admin: bool,
}

impl<'a> From<&'a CurrentUser> for LayoutUser<'a> {
    fn from(current: &'a CurrentUser) -> Self {
        Self {
            id: current.viewer.id,
            email: &current.user.email,
            is_admin: current.is_admin(),
        }
    }
}
