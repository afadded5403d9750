//! Account forms: admin user management, registration, self-service account
//! and password change.
//!
//! Every form that carries a password runs [`hash_password_on_submit`]
//! while binding, so the `User` only ever receives the hash.

use super::constraints::{email, length, not_blank, untrimmed_length};
use super::{FormError, FormErrors};
use crate::model::user::{Role, User};
use crate::security::PasswordHasher;
use serde::Deserialize;

const EMAIL_MAX: usize = 180;
const NAME_MAX: usize = 180;
const PASSWORD_MAX: usize = 64;

/// Submit listener: replaces the submitted plaintext with its hash.
pub fn hash_password_on_submit(
    user: &mut User,
    plain: &str,
    hasher: &dyn PasswordHasher,
) -> Result<(), FormError> {
    user.password = hasher.hash_password(plain)?;
    Ok(())
}

fn validate_identity(errors: &mut FormErrors, email_value: &str, name: &str) {
    errors.check("email", not_blank(email_value));
    if !errors.has("email") {
        errors.check("email", email(email_value));
        errors.check("email", length(email_value, 1, EMAIL_MAX));
    }
    errors.check("name", not_blank(name));
    errors.check("name", length(name, 0, NAME_MAX));
}

fn validate_password(errors: &mut FormErrors, password: &str) {
    errors.check("password", not_blank(password));
    errors.check("password", untrimmed_length(password, 0, PASSWORD_MAX));
}

/// Admin-facing user form (`/user/create`, `/user/{id}/edit`).
///
/// The password is only read when creating a user; edits change it through
/// [`PasswordForm`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserForm {
    pub email: String,
    pub name: String,
    /// Grants `ROLE_ADMIN` in addition to the implied `ROLE_USER`.
    pub is_admin: bool,
    pub password: Option<String>,
}

impl UserForm {
    /// Prefills the form from an existing user.
    pub fn from_user(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            name: user.name.clone(),
            is_admin: user.is_admin(),
            password: None,
        }
    }

    pub fn roles(&self) -> Vec<Role> {
        if self.is_admin {
            vec![Role::User, Role::Admin]
        } else {
            vec![Role::User]
        }
    }

    pub fn validate(&self, creating: bool) -> FormErrors {
        let mut errors = FormErrors::new();
        validate_identity(&mut errors, &self.email, &self.name);
        if creating {
            validate_password(&mut errors, self.password.as_deref().unwrap_or_default());
        }
        errors
    }

    /// Validates and binds onto `user`; `user.id` decides create vs edit.
    pub fn submit(&self, user: &mut User, hasher: &dyn PasswordHasher) -> Result<(), FormError> {
        let creating = user.id.is_none();
        self.validate(creating).into_result()?;

        user.email = self.email.trim().to_string();
        user.name = self.name.trim().to_string();
        user.set_roles(self.roles());
        if creating {
            hash_password_on_submit(user, self.password.as_deref().unwrap_or_default(), hasher)?;
        }
        Ok(())
    }
}

/// Password change form (`/user/{id}/password`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PasswordForm {
    pub password: String,
}

impl PasswordForm {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        validate_password(&mut errors, &self.password);
        errors
    }

    pub fn submit(&self, user: &mut User, hasher: &dyn PasswordHasher) -> Result<(), FormError> {
        self.validate().into_result()?;
        hash_password_on_submit(user, &self.password, hasher)
    }
}

/// Public sign-up form (`/register`). New accounts only get `ROLE_USER`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        validate_identity(&mut errors, &self.email, &self.name);
        validate_password(&mut errors, &self.password);
        errors
    }

    /// Builds an unsaved user with a hashed password.
    pub fn submit(&self, hasher: &dyn PasswordHasher) -> Result<User, FormError> {
        self.validate().into_result()?;
        let mut user = User::new(self.email.trim(), self.name.trim());
        hash_password_on_submit(&mut user, &self.password, hasher)?;
        Ok(user)
    }
}

/// Self-service account form (`/account`).
///
/// A blank password keeps the current one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AccountForm {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl AccountForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            name: user.name.clone(),
            password: String::new(),
        }
    }

    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        validate_identity(&mut errors, &self.email, &self.name);
        if !self.password.is_empty() {
            validate_password(&mut errors, &self.password);
        }
        errors
    }

    pub fn submit(&self, user: &mut User, hasher: &dyn PasswordHasher) -> Result<(), FormError> {
        self.validate().into_result()?;
        user.email = self.email.trim().to_string();
        user.name = self.name.trim().to_string();
        if !self.password.is_empty() {
            hash_password_on_submit(user, &self.password, hasher)?;
        }
        Ok(())
    }
}
