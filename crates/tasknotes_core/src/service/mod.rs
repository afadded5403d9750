//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Resolve request parameters (filter ids, tag titles) into entities.
//! - Apply list visibility rules: admins see everything, users their own.
//!
//! # Invariants
//! - Services never bypass repository persistence contracts.
//! - Services stay storage-agnostic: they only see repository traits.

use crate::form::{FormError, FormErrors};
use crate::model::category::CategoryId;
use crate::repo::RepoError;
use crate::security::{AccessDenied, SecurityError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod auth_service;
pub mod category_service;
pub mod entry_service;
pub mod tag_service;
pub mod user_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error shared by all use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Target record does not exist.
    NotFound { entity: &'static str, id: i64 },
    /// Viewer lacks the permission.
    AccessDenied(AccessDenied),
    /// Input failed validation; the form should be re-rendered.
    Invalid(FormErrors),
    /// Unknown email or wrong password.
    InvalidCredentials,
    /// Category still has tasks or notes filed under it.
    CategoryInUse(CategoryId),
    Security(SecurityError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::AccessDenied(err) => write!(f, "{err}"),
            Self::Invalid(errors) => write!(f, "invalid input: {errors}"),
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::CategoryInUse(id) => write!(f, "category {id} is still in use"),
            Self::Security(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::AccessDenied(err) => Some(err),
            Self::Invalid(errors) => Some(errors),
            Self::Security(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Repo(other),
        }
    }
}

impl From<AccessDenied> for ServiceError {
    fn from(value: AccessDenied) -> Self {
        Self::AccessDenied(value)
    }
}

impl From<FormErrors> for ServiceError {
    fn from(value: FormErrors) -> Self {
        Self::Invalid(value)
    }
}

impl From<SecurityError> for ServiceError {
    fn from(value: SecurityError) -> Self {
        Self::Security(value)
    }
}

impl From<FormError> for ServiceError {
    fn from(value: FormError) -> Self {
        match value {
            FormError::Invalid(errors) => Self::Invalid(errors),
            FormError::Security(err) => Self::Security(err),
        }
    }
}

/// Turns a unique-email violation into a field error on `email`.
pub(crate) fn duplicate_email_as_invalid(err: RepoError) -> ServiceError {
    match err {
        RepoError::Duplicate { field: "email", .. } => {
            let mut errors = FormErrors::new();
            errors.add("email", "There is already an account with this email.");
            ServiceError::Invalid(errors)
        }
        other => other.into(),
    }
}
