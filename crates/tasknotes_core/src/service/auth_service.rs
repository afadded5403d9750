//! Login, logout, registration and self-service account use-cases.
//!
//! # Invariants
//! - Failed logins never reveal whether the email exists.
//! - Session tokens are only issued after password verification.

use super::{duplicate_email_as_invalid, ServiceError, ServiceResult};
use crate::form::{AccountForm, RegistrationForm};
use crate::model::user::{User, UserId};
use crate::repo::session_repo::SessionRepository;
use crate::repo::user_repo::UserRepository;
use crate::security::PasswordHasher;
use log::{info, warn};

/// Authenticated session handed back to the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSession {
    pub token: String,
    pub user: User,
}

pub struct AuthService<U: UserRepository, S: SessionRepository> {
    users: U,
    sessions: S,
}

impl<U: UserRepository, S: SessionRepository> AuthService<U, S> {
    pub fn new(users: U, sessions: S) -> Self {
        Self { users, sessions }
    }

    pub fn login(
        &self,
        email: &str,
        password: &str,
        hasher: &dyn PasswordHasher,
    ) -> ServiceResult<LoginSession> {
        let user = match self.users.find_one_by_email(email)? {
            Some(user) if hasher.verify_password(&user.password, password) => user,
            _ => {
                warn!("event=user_login module=auth status=rejected");
                return Err(ServiceError::InvalidCredentials);
            }
        };
        let user_id = persisted_id(&user)?;
        let token = self.sessions.create(user_id)?;
        info!("event=user_login module=auth status=ok user_id={user_id}");
        Ok(LoginSession { token, user })
    }

    pub fn logout(&self, token: &str) -> ServiceResult<()> {
        self.sessions.delete(token)?;
        info!("event=user_logout module=auth status=ok");
        Ok(())
    }

    /// Resolves a session token to its user; stale tokens yield `None`.
    pub fn current_user(&self, token: &str) -> ServiceResult<Option<User>> {
        match self.sessions.find_user_id(token)? {
            Some(user_id) => Ok(self.users.find_one_by_id(user_id)?),
            None => Ok(None),
        }
    }

    pub fn register(
        &self,
        form: &RegistrationForm,
        hasher: &dyn PasswordHasher,
    ) -> ServiceResult<User> {
        let mut user = form.submit(hasher)?;
        let id = self.users.save(&mut user).map_err(duplicate_email_as_invalid)?;
        info!("event=user_register module=auth status=ok user_id={id}");
        Ok(user)
    }

    pub fn update_account(
        &self,
        user_id: UserId,
        form: &AccountForm,
        hasher: &dyn PasswordHasher,
    ) -> ServiceResult<User> {
        let mut user = self
            .users
            .find_one_by_id(user_id)?
            .ok_or(ServiceError::NotFound {
                entity: "user",
                id: user_id,
            })?;
        form.submit(&mut user, hasher)?;
        self.users
            .save(&mut user)
            .map_err(duplicate_email_as_invalid)?;
        info!("event=account_update module=auth status=ok user_id={user_id}");
        Ok(user)
    }
}

fn persisted_id(user: &User) -> ServiceResult<UserId> {
    user.id.ok_or_else(|| {
        ServiceError::Repo(crate::repo::RepoError::InvalidData(
            "loaded user without id".to_string(),
        ))
    })
}
