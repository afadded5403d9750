mod common;

use common::{create_category, create_user, entry_service};
use tasknotes_core::db::open_db_in_memory;
use tasknotes_core::form::{CategoryForm, EntryForm, TagForm};
use tasknotes_core::repo::category_repo::SqliteCategoryRepository;
use tasknotes_core::repo::tag_repo::SqliteTagRepository;
use tasknotes_core::service::category_service::CategoryService;
use tasknotes_core::service::tag_service::TagService;
use tasknotes_core::{Category, EntryKind, ServiceError, Tag};

#[test]
fn duplicate_tag_title_fails_validation() {
    let conn = open_db_in_memory().unwrap();
    let service = TagService::new(SqliteTagRepository::try_new(&conn).unwrap());

    let mut first = Tag::new("");
    service
        .save_from_form(&mut first, &TagForm { title: "Rust".to_string() })
        .unwrap();

    let mut second = Tag::new("");
    let err = service
        .save_from_form(&mut second, &TagForm { title: "rust".to_string() })
        .unwrap_err();
    match err {
        ServiceError::Invalid(errors) => {
            assert_eq!(errors.get("title"), ["This value is already used."]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(second.id.is_none());
    assert_eq!(service.find_all().unwrap().len(), 1);
}

#[test]
fn resolving_titles_reuses_existing_tags_in_input_order() {
    let conn = open_db_in_memory().unwrap();
    let service = TagService::new(SqliteTagRepository::try_new(&conn).unwrap());
    let mut existing = Tag::new("Home");
    service.save(&mut existing).unwrap();

    let titles = vec!["Garden".to_string(), "Home".to_string()];
    let tags = service.resolve_titles(&titles).unwrap();

    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0].title, "Garden");
    assert!(tags[0].id.is_some());
    assert_eq!(tags[1].id, existing.id);
    assert_eq!(service.find_all().unwrap().len(), 2);
}

#[test]
fn renaming_a_tag_to_its_own_title_is_allowed() {
    let conn = open_db_in_memory().unwrap();
    let service = TagService::new(SqliteTagRepository::try_new(&conn).unwrap());

    let mut tag = Tag::new("");
    service
        .save_from_form(&mut tag, &TagForm { title: "Planning".to_string() })
        .unwrap();
    service
        .save_from_form(&mut tag, &TagForm { title: "Planning".to_string() })
        .unwrap();

    assert_eq!(tag.slug, "planning");
}

#[test]
fn direct_duplicate_save_is_still_reported_as_validation_error() {
    let conn = open_db_in_memory().unwrap();
    let service = TagService::new(SqliteTagRepository::try_new(&conn).unwrap());

    service.save(&mut Tag::new("backend")).unwrap();
    let err = service.save(&mut Tag::new("Backend")).unwrap_err();
    assert!(matches!(err, ServiceError::Invalid(errors) if errors.has("title")));
}

#[test]
fn category_slug_follows_title_and_timestamps_are_ordered() {
    let conn = open_db_in_memory().unwrap();
    let service = CategoryService::new(SqliteCategoryRepository::try_new(&conn).unwrap());

    let mut category = Category::new("");
    service
        .save_from_form(
            &mut category,
            &CategoryForm {
                title: "Work & Life".to_string(),
            },
        )
        .unwrap();
    assert_eq!(category.slug, "work-life");
    let created_at = category.created_at.unwrap();

    service
        .save_from_form(
            &mut category,
            &CategoryForm {
                title: "Side projects".to_string(),
            },
        )
        .unwrap();
    assert_eq!(category.slug, "side-projects");
    assert_eq!(category.created_at, Some(created_at));
    assert!(category.updated_at.unwrap() >= created_at);
}

#[test]
fn category_in_use_cannot_be_deleted() {
    let conn = open_db_in_memory().unwrap();
    let (_, alice) = create_user(&conn, "alice@example.com", "secret", false);
    let used = create_category(&conn, "Used");
    let unused = create_category(&conn, "Unused");
    entry_service(&conn, EntryKind::Note)
        .create_from_form(
            &alice,
            &EntryForm {
                title: "Filed note".to_string(),
                category_id: Some(used),
                ..EntryForm::default()
            },
        )
        .unwrap();

    let service = CategoryService::new(SqliteCategoryRepository::try_new(&conn).unwrap());
    assert!(!service.can_be_deleted(used).unwrap());
    assert!(matches!(
        service.delete(used).unwrap_err(),
        ServiceError::CategoryInUse(id) if id == used
    ));

    service.delete(unused).unwrap();
    assert!(service.find_one_by_id(unused).unwrap().is_none());
}

#[test]
fn entry_tags_are_created_on_the_fly_and_reused() {
    let conn = open_db_in_memory().unwrap();
    let (_, alice) = create_user(&conn, "alice@example.com", "secret", false);
    let category = create_category(&conn, "Inbox");
    let tasks = entry_service(&conn, EntryKind::Task);
    let entry = |tags: &str| EntryForm {
        title: "Tagged task".to_string(),
        category_id: Some(category),
        tags: tags.to_string(),
        ..EntryForm::default()
    };

    tasks.create_from_form(&alice, &entry("urgent, home")).unwrap();
    tasks.create_from_form(&alice, &entry("Urgent, errands")).unwrap();

    let tags = TagService::new(SqliteTagRepository::try_new(&conn).unwrap())
        .find_all()
        .unwrap();
    let titles: Vec<_> = tags.iter().map(|tag| tag.title.as_str()).collect();
    assert_eq!(titles.len(), 3);
    assert!(titles.contains(&"urgent"));
    assert!(titles.contains(&"errands"));
}

#[test]
fn failed_entry_save_leaves_no_new_tags_behind() {
    let conn = open_db_in_memory().unwrap();
    let (_, alice) = create_user(&conn, "alice@example.com", "secret", false);
    let category = create_category(&conn, "Inbox");
    let tasks = entry_service(&conn, EntryKind::Task);
    let record = tasks
        .create_from_form(
            &alice,
            &EntryForm {
                title: "Short lived".to_string(),
                category_id: Some(category),
                tags: "kept".to_string(),
                ..EntryForm::default()
            },
        )
        .unwrap();
    tasks.delete(record.id).unwrap();

    let stale_edit = EntryForm {
        title: "Short lived".to_string(),
        category_id: Some(category),
        tags: "kept, stray".to_string(),
        ..EntryForm::default()
    };
    assert!(tasks.update_from_form(&record, &stale_edit).is_err());

    let tags = TagService::new(SqliteTagRepository::try_new(&conn).unwrap());
    assert!(tags.find_one_by_title("kept").unwrap().is_some());
    assert!(tags.find_one_by_title("stray").unwrap().is_none());
}

#[test]
fn deleting_a_tag_unlinks_it_from_entries() {
    let conn = open_db_in_memory().unwrap();
    let (_, alice) = create_user(&conn, "alice@example.com", "secret", false);
    let category = create_category(&conn, "Inbox");
    let notes = entry_service(&conn, EntryKind::Note);
    let record = notes
        .create_from_form(
            &alice,
            &EntryForm {
                title: "Linked".to_string(),
                category_id: Some(category),
                tags: "ephemeral".to_string(),
                ..EntryForm::default()
            },
        )
        .unwrap();
    let tag_id = record.tags[0].id.unwrap();

    TagService::new(SqliteTagRepository::try_new(&conn).unwrap())
        .delete(tag_id)
        .unwrap();

    let reloaded = notes.find_one_by_id(record.id).unwrap().unwrap();
    assert!(reloaded.tags.is_empty());
}
