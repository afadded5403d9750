//! Tag use-case service.
//!
//! # Invariants
//! - Tag titles stay unique: a clashing title is reported as a validation
//!   error on `title`, never as a storage failure.

use super::{ServiceError, ServiceResult};
use crate::form::{FormErrors, TagForm};
use crate::model::page::{Page, PageRequest};
use crate::model::tag::{Tag, TagId};
use crate::repo::tag_repo::TagRepository;
use crate::repo::RepoError;
use log::info;

const DUPLICATE_TITLE_MESSAGE: &str = "This value is already used.";

pub struct TagService<T: TagRepository> {
    repo: T,
}

impl<T: TagRepository> TagService<T> {
    pub fn new(repo: T) -> Self {
        Self { repo }
    }

    pub fn get_paginated_list(&self, page: u32) -> ServiceResult<Page<Tag>> {
        Ok(self.repo.query_all(PageRequest::new(page))?)
    }

    pub fn find_one_by_id(&self, id: TagId) -> ServiceResult<Option<Tag>> {
        Ok(self.repo.find_one_by_id(id)?)
    }

    pub fn find_one_by_title(&self, title: &str) -> ServiceResult<Option<Tag>> {
        Ok(self.repo.find_one_by_title(title)?)
    }

    pub fn find_all(&self) -> ServiceResult<Vec<Tag>> {
        Ok(self.repo.find_all()?)
    }

    /// Validates `form`, checks title uniqueness and persists onto `tag`.
    pub fn save_from_form(&self, tag: &mut Tag, form: &TagForm) -> ServiceResult<TagId> {
        form.validate().into_result()?;
        if let Some(existing) = self.repo.find_one_by_title(&form.title)? {
            if existing.id != tag.id {
                return Err(duplicate_title_error());
            }
        }
        tag.title = form.title.trim().to_string();
        self.save(tag)
    }

    /// Persists `tag`; the unique index still guards against races.
    pub fn save(&self, tag: &mut Tag) -> ServiceResult<TagId> {
        let id = self.repo.save(tag).map_err(|err| match err {
            RepoError::Duplicate { .. } => duplicate_title_error(),
            other => other.into(),
        })?;
        info!("event=tag_save module=service status=ok id={id}");
        Ok(id)
    }

    pub fn delete(&self, id: TagId) -> ServiceResult<()> {
        self.repo.delete(id)?;
        info!("event=tag_delete module=service status=ok id={id}");
        Ok(())
    }

    /// Maps titles to tags, creating the ones that do not exist yet.
    pub fn resolve_titles(&self, titles: &[String]) -> ServiceResult<Vec<Tag>> {
        resolve_tag_titles(&self.repo, titles)
    }
}

/// Find-or-create for a list of tag titles, preserving input order.
pub(crate) fn resolve_tag_titles<T: TagRepository>(
    repo: &T,
    titles: &[String],
) -> ServiceResult<Vec<Tag>> {
    let mut tags = Vec::with_capacity(titles.len());
    for title in titles {
        let tag = match repo.find_one_by_title(title)? {
            Some(existing) => existing,
            None => {
                let mut created = Tag::new(title.trim());
                match repo.save(&mut created) {
                    Ok(_) => created,
                    // Inserted concurrently since the lookup above.
                    Err(duplicate @ RepoError::Duplicate { .. }) => {
                        match repo.find_one_by_title(title)? {
                            Some(existing) => existing,
                            None => return Err(duplicate.into()),
                        }
                    }
                    Err(other) => return Err(other.into()),
                }
            }
        };
        tags.push(tag);
    }
    Ok(tags)
}

fn duplicate_title_error() -> ServiceError {
    let mut errors = FormErrors::new();
    errors.add("title", DUPLICATE_TITLE_MESSAGE);
    ServiceError::Invalid(errors)
}

#[cfg(test)]
mod tests {
    use super::resolve_tag_titles;
    use crate::model::page::{Page, PageRequest};
    use crate::model::tag::{Tag, TagId};
    use crate::repo::tag_repo::TagRepository;
    use crate::repo::{RepoError, RepoResult};
    use std::cell::Cell;

    /// Reports "missing" on the first lookup, then finds the tag another
    /// writer inserted in between.
    struct RacingTags {
        lookups: Cell<u32>,
    }

    impl TagRepository for RacingTags {
        fn find_one_by_id(&self, _id: TagId) -> RepoResult<Option<Tag>> {
            Ok(None)
        }

        fn find_one_by_title(&self, title: &str) -> RepoResult<Option<Tag>> {
            let seen = self.lookups.get();
            self.lookups.set(seen + 1);
            if seen == 0 {
                return Ok(None);
            }
            let mut tag = Tag::new(title);
            tag.id = Some(41);
            Ok(Some(tag))
        }

        fn query_all(&self, page: PageRequest) -> RepoResult<Page<Tag>> {
            Ok(Page::new(Vec::new(), page, 0))
        }

        fn find_all(&self) -> RepoResult<Vec<Tag>> {
            Ok(Vec::new())
        }

        fn save(&self, _tag: &mut Tag) -> RepoResult<TagId> {
            Err(RepoError::Duplicate {
                entity: "tag",
                field: "title",
            })
        }

        fn delete(&self, _id: TagId) -> RepoResult<()> {
            Ok(())
        }
    }

    #[test]
    fn concurrent_insert_resolves_to_the_existing_tag() {
        let repo = RacingTags {
            lookups: Cell::new(0),
        };
        let tags = resolve_tag_titles(&repo, &["late".to_string()]).unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].id, Some(41));
        assert_eq!(repo.lookups.get(), 2);
    }
}
