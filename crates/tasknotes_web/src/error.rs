//! Error to HTTP status mapping.
//!
//! # Invariants
//! - `AccessDenied` is 403, missing records and malformed ids are 404.
//! - Anonymous access to a protected page redirects (303) to `/login`.
//! - Internal failures are logged with their cause and answered with a
//!   generic 500 page that leaks nothing.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use log::{error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use tasknotes_core::security::AccessDenied;
use tasknotes_core::{DbError, RepoError, ServiceError};

pub type WebResult<T> = Result<T, WebError>;

#[derive(Debug)]
pub enum WebError {
    NotFound,
    AccessDenied(AccessDenied),
    /// Admin-only page requested by a regular user.
    Forbidden,
    /// No valid session cookie on a protected route.
    Unauthenticated,
    Template(tera::Error),
    Db(DbError),
    Service(ServiceError),
    /// Blocking worker panicked or was cancelled.
    Worker(String),
}

impl Display for WebError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::AccessDenied(err) => write!(f, "{err}"),
            Self::Forbidden => write!(f, "admin role required"),
            Self::Unauthenticated => write!(f, "authentication required"),
            Self::Template(err) => write!(f, "template error: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Service(err) => write!(f, "{err}"),
            Self::Worker(message) => write!(f, "worker failed: {message}"),
        }
    }
}

impl Error for WebError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::AccessDenied(err) => Some(err),
            Self::Template(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Service(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ServiceError> for WebError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::NotFound { .. } => Self::NotFound,
            ServiceError::AccessDenied(err) => Self::AccessDenied(err),
            other => Self::Service(other),
        }
    }
}

impl From<RepoError> for WebError {
    fn from(value: RepoError) -> Self {
        ServiceError::from(value).into()
    }
}

impl From<AccessDenied> for WebError {
    fn from(value: AccessDenied) -> Self {
        Self::AccessDenied(value)
    }
}

impl From<DbError> for WebError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<tera::Error> for WebError {
    fn from(value: tera::Error) -> Self {
        Self::Template(value)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => error_page(StatusCode::NOT_FOUND, "Page not found."),
            Self::AccessDenied(err) => {
                warn!("event=access_denied module=web status=rejected detail={err}");
                error_page(StatusCode::FORBIDDEN, "Access denied.")
            }
            Self::Forbidden => {
                warn!("event=access_denied module=web status=rejected detail=admin_required");
                error_page(StatusCode::FORBIDDEN, "Access denied.")
            }
            Self::Unauthenticated => Redirect::to("/login").into_response(),
            Self::Service(ServiceError::Invalid(errors)) => {
                warn!("event=form_invalid module=web status=rejected errors={errors}");
                error_page(StatusCode::UNPROCESSABLE_ENTITY, "Submitted data is invalid.")
            }
            other => {
                error!("event=http_error module=web status=error error={other}");
                error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again later.",
                )
            }
        }
    }
}

fn error_page(status: StatusCode, message: &str) -> Response {
    let body = format!(
        "<!DOCTYPE html><html><head><title>{code}</title></head>\
         <body><h1>{code}</h1><p>{message}</p><p><a href=\"/\">Back to start</a></p></body></html>",
        code = status.as_u16()
    );
    (status, Html(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::WebError;
    use axum::http::{header, StatusCode};
    use axum::response::IntoResponse;
    use tasknotes_core::security::{AccessDenied, Permission, Subject};
    use tasknotes_core::ServiceError;

    #[test]
    fn service_errors_map_to_statuses() {
        let not_found: WebError = ServiceError::NotFound {
            entity: "task",
            id: 7,
        }
        .into();
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let denied: WebError = ServiceError::AccessDenied(AccessDenied {
            permission: Permission::Edit,
            subject: Subject::User(3),
        })
        .into();
        assert_eq!(denied.into_response().status(), StatusCode::FORBIDDEN);

        let failed: WebError = ServiceError::InvalidCredentials.into();
        assert_eq!(
            failed.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unauthenticated_redirects_to_login() {
        let response = WebError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login"
        );
    }
}
