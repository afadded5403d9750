//! Declarative form types bound onto domain records.
//!
//! # Responsibility
//! - Describe the fields each form accepts and the constraints on them.
//! - Bind validated input onto entities (`submit`).
//! - Hash passwords at submit time so nothing downstream sees plaintext.
//!
//! # Invariants
//! - `submit` never touches the entity when validation fails.
//! - An empty `FormErrors` means the form is valid.

use crate::security::SecurityError;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub mod constraints;
pub mod entry_form;
pub mod taxonomy_form;
pub mod user_form;

pub use entry_form::EntryForm;
pub use taxonomy_form::{CategoryForm, TagForm, TaxonomyForm};
pub use user_form::{AccountForm, PasswordForm, RegistrationForm, UserForm};

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Appends `message` when `check` produced one.
    pub fn check(&mut self, field: &str, check: Option<String>) {
        if let Some(message) = check {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map_or(&[], Vec::as_slice)
    }

    pub fn has(&self, field: &str) -> bool {
        !self.get(field).is_empty()
    }

    /// Converts into `Err(self)` unless empty.
    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for FormErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl Error for FormErrors {}

/// Failure while submitting a form.
#[derive(Debug)]
pub enum FormError {
    /// Input failed validation; re-render with these errors.
    Invalid(FormErrors),
    /// The submit listener could not hash the password.
    Security(SecurityError),
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(errors) => write!(f, "invalid form: {errors}"),
            Self::Security(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FormError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(errors) => Some(errors),
            Self::Security(err) => Some(err),
        }
    }
}

impl From<FormErrors> for FormError {
    fn from(value: FormErrors) -> Self {
        Self::Invalid(value)
    }
}

impl From<SecurityError> for FormError {
    fn from(value: SecurityError) -> Self {
        Self::Security(value)
    }
}

/// Deserializes blank form/query values as `None` instead of failing.
pub fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => T::from_str(text).map(Some).map_err(de::Error::custom),
    }
}

/// Deserializes optional query filters; blank or unparsable values become
/// `None` so a stray parameter never rejects the request.
pub fn lenient_id<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|text| T::from_str(text.trim()).ok()))
}
