//! Category use-case service.

use super::{ServiceError, ServiceResult};
use crate::form::CategoryForm;
use crate::model::category::{Category, CategoryId};
use crate::model::page::{Page, PageRequest};
use crate::repo::category_repo::CategoryRepository;
use log::info;

pub struct CategoryService<C: CategoryRepository> {
    repo: C,
}

impl<C: CategoryRepository> CategoryService<C> {
    pub fn new(repo: C) -> Self {
        Self { repo }
    }

    pub fn get_paginated_list(&self, page: u32) -> ServiceResult<Page<Category>> {
        Ok(self.repo.query_all(PageRequest::new(page))?)
    }

    pub fn find_one_by_id(&self, id: CategoryId) -> ServiceResult<Option<Category>> {
        Ok(self.repo.find_one_by_id(id)?)
    }

    pub fn find_all(&self) -> ServiceResult<Vec<Category>> {
        Ok(self.repo.find_all()?)
    }

    pub fn save_from_form(
        &self,
        category: &mut Category,
        form: &CategoryForm,
    ) -> ServiceResult<CategoryId> {
        form.validate().into_result()?;
        category.title = form.title.trim().to_string();
        self.save(category)
    }

    pub fn save(&self, category: &mut Category) -> ServiceResult<CategoryId> {
        let id = self.repo.save(category)?;
        info!("event=category_save module=service status=ok id={id}");
        Ok(id)
    }

    /// Whether no task or note is filed under the category.
    pub fn can_be_deleted(&self, id: CategoryId) -> ServiceResult<bool> {
        Ok(self.repo.count_entries(id)? == 0)
    }

    pub fn delete(&self, id: CategoryId) -> ServiceResult<()> {
        if !self.can_be_deleted(id)? {
            return Err(ServiceError::CategoryInUse(id));
        }
        self.repo.delete(id)?;
        info!("event=category_delete module=service status=ok id={id}");
        Ok(())
    }
}
