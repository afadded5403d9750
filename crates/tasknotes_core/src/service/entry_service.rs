//! Task/note use-case service.
//!
//! # Responsibility
//! - Paginated lists with category/tag filters and author visibility.
//! - Create/update from `EntryForm`, resolving tag titles to tags.
//!
//! # Invariants
//! - Non-admin viewers only ever list entries they authored.
//! - Unknown filter ids are dropped, never reported as errors.
//! - Tags created for a form are rolled back together with the entry when
//!   the entry cannot be saved.

use super::tag_service::resolve_tag_titles;
use super::{ServiceError, ServiceResult};
use crate::form::EntryForm;
use crate::model::entry::{
    Entry, EntryFilterParams, EntryFilters, EntryId, EntryKind, EntryRecord,
};
use crate::model::page::{Page, PageRequest};
use crate::model::user::Role;
use crate::repo::category_repo::CategoryRepository;
use crate::repo::entry_repo::EntryRepository;
use crate::repo::tag_repo::TagRepository;
use crate::security::Viewer;
use log::info;

/// Service for one entry kind; the kind comes from the repository.
pub struct EntryService<R: EntryRepository, C: CategoryRepository, T: TagRepository> {
    repo: R,
    categories: C,
    tags: T,
}

impl<R, C, T> EntryService<R, C, T>
where
    R: EntryRepository,
    C: CategoryRepository,
    T: TagRepository,
{
    pub fn new(repo: R, categories: C, tags: T) -> Self {
        Self {
            repo,
            categories,
            tags,
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.repo.kind()
    }

    /// Lists entries page by page.
    ///
    /// Admins get every entry matching `filters`; everybody else only gets
    /// entries where `author == viewer`.
    pub fn get_paginated_list(
        &self,
        page: u32,
        viewer: &Viewer,
        filters: EntryFilterParams,
    ) -> ServiceResult<Page<EntryRecord>> {
        let filters = self.prepare_filters(filters)?;
        let request = PageRequest::new(page);
        let result = if viewer.is_granted(Role::Admin) {
            self.repo.query_all(&filters, request)?
        } else {
            self.repo.query_by_author(viewer.id, &filters, request)?
        };
        Ok(result)
    }

    pub fn find_one_by_id(&self, id: EntryId) -> ServiceResult<Option<EntryRecord>> {
        Ok(self.repo.find_one_by_id(id)?)
    }

    pub fn save(&self, entry: &mut Entry) -> ServiceResult<EntryId> {
        let id = self.repo.save(entry)?;
        info!(
            "event=entry_save module=service status=ok kind={} id={}",
            self.kind().as_str(),
            id
        );
        Ok(id)
    }

    pub fn delete(&self, id: EntryId) -> ServiceResult<()> {
        self.repo.delete(id)?;
        info!(
            "event=entry_delete module=service status=ok kind={} id={}",
            self.kind().as_str(),
            id
        );
        Ok(())
    }

    /// Creates an entry authored by `viewer`.
    pub fn create_from_form(
        &self,
        viewer: &Viewer,
        form: &EntryForm,
    ) -> ServiceResult<EntryRecord> {
        let mut entry = Entry::new(self.kind(), "", "", 0);
        entry.set_author(Some(viewer.id));
        self.apply_form(&mut entry, form)
    }

    /// Applies an edit form onto an existing entry, keeping its author.
    pub fn update_from_form(
        &self,
        existing: &EntryRecord,
        form: &EntryForm,
    ) -> ServiceResult<EntryRecord> {
        let mut entry = existing.to_entry();
        self.apply_form(&mut entry, form)
    }

    fn apply_form(&self, entry: &mut Entry, form: &EntryForm) -> ServiceResult<EntryRecord> {
        let mut errors = form.validate();
        if let Some(category_id) = form.category_id {
            if self.categories.find_one_by_id(category_id)?.is_none() {
                errors.add("category_id", "Choose a valid category.");
            }
        }
        errors.into_result()?;

        let id = self.repo.within_transaction(|| {
            let tags = resolve_tag_titles(&self.tags, &form.tag_titles())?;
            form.bind(entry, tags.iter().filter_map(|tag| tag.id));
            self.save(entry)
        })?;
        self.repo
            .find_one_by_id(id)?
            .ok_or(ServiceError::NotFound {
                entity: self.kind().as_str(),
                id,
            })
    }

    fn prepare_filters(&self, params: EntryFilterParams) -> ServiceResult<EntryFilters> {
        let mut filters = EntryFilters::default();
        if let Some(category_id) = params.category_id {
            filters.category = self.categories.find_one_by_id(category_id)?;
        }
        if let Some(tag_id) = params.tag_id {
            filters.tag = self.tags.find_one_by_id(tag_id)?;
        }
        Ok(filters)
    }
}
