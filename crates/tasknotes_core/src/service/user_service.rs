//! User management use-case service.
//!
//! # Invariants
//! - Passwords reach the repository only as hashes (forms hash on submit).
//! - Deleting a user keeps their tasks and notes, now without an author.

use super::{duplicate_email_as_invalid, ServiceError, ServiceResult};
use crate::form::{PasswordForm, UserForm};
use crate::model::page::{Page, PageRequest};
use crate::model::user::{User, UserId};
use crate::repo::user_repo::UserRepository;
use crate::security::PasswordHasher;
use log::info;

pub struct UserService<U: UserRepository> {
    repo: U,
}

impl<U: UserRepository> UserService<U> {
    pub fn new(repo: U) -> Self {
        Self { repo }
    }

    pub fn get_paginated_list(&self, page: u32) -> ServiceResult<Page<User>> {
        Ok(self.repo.query_all(PageRequest::new(page))?)
    }

    pub fn find_one_by_id(&self, id: UserId) -> ServiceResult<Option<User>> {
        Ok(self.repo.find_one_by_id(id)?)
    }

    /// Loads a user or fails with `NotFound`.
    pub fn get(&self, id: UserId) -> ServiceResult<User> {
        self.repo
            .find_one_by_id(id)?
            .ok_or(ServiceError::NotFound { entity: "user", id })
    }

    pub fn save(&self, user: &mut User) -> ServiceResult<UserId> {
        let id = self.repo.save(user).map_err(duplicate_email_as_invalid)?;
        info!("event=user_save module=service status=ok id={id}");
        Ok(id)
    }

    pub fn delete(&self, id: UserId) -> ServiceResult<()> {
        self.repo.delete(id)?;
        info!("event=user_delete module=service status=ok id={id}");
        Ok(())
    }

    pub fn create_from_form(
        &self,
        form: &UserForm,
        hasher: &dyn PasswordHasher,
    ) -> ServiceResult<User> {
        let mut user = User::new("", "");
        form.submit(&mut user, hasher)?;
        self.save(&mut user)?;
        Ok(user)
    }

    pub fn update_from_form(
        &self,
        id: UserId,
        form: &UserForm,
        hasher: &dyn PasswordHasher,
    ) -> ServiceResult<User> {
        let mut user = self.get(id)?;
        form.submit(&mut user, hasher)?;
        self.save(&mut user)?;
        Ok(user)
    }

    pub fn change_password(
        &self,
        id: UserId,
        form: &PasswordForm,
        hasher: &dyn PasswordHasher,
    ) -> ServiceResult<User> {
        let mut user = self.get(id)?;
        form.submit(&mut user, hasher)?;
        self.save(&mut user)?;
        info!("event=user_password_change module=service status=ok id={id}");
        Ok(user)
    }
}
