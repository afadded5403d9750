mod common;

use common::{create_category, create_user, entry_service, hasher};
use tasknotes_core::db::open_db_in_memory;
use tasknotes_core::form::{AccountForm, EntryForm, PasswordForm, RegistrationForm, UserForm};
use tasknotes_core::repo::session_repo::{SqliteSessionRepository, SESSION_MAX_AGE_MS};
use tasknotes_core::repo::user_repo::SqliteUserRepository;
use tasknotes_core::security::PasswordHasher;
use tasknotes_core::service::auth_service::AuthService;
use tasknotes_core::service::user_service::UserService;
use tasknotes_core::{EntryFilterParams, EntryKind, Role, ServiceError};

#[test]
fn created_users_never_store_plaintext_passwords() {
    let conn = open_db_in_memory().unwrap();
    let service = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());
    let hasher = hasher();

    let user = service
        .create_from_form(
            &UserForm {
                email: "carol@example.com".to_string(),
                name: "Carol".to_string(),
                is_admin: false,
                password: Some("plain-secret".to_string()),
            },
            &hasher,
        )
        .unwrap();

    let stored: String = conn
        .query_row(
            "SELECT password FROM users WHERE id = ?1;",
            [user.id.unwrap()],
            |row| row.get(0),
        )
        .unwrap();
    assert_ne!(stored, "plain-secret");
    assert!(stored.starts_with("$argon2"));
    assert!(hasher.verify_password(&stored, "plain-secret"));

    let json = serde_json::to_string(&user).unwrap();
    assert!(!json.contains("argon2"));
    assert!(!json.contains("plain-secret"));
}

#[test]
fn deleting_a_user_keeps_their_entries_without_author() {
    let conn = open_db_in_memory().unwrap();
    let (alice_user, alice) = create_user(&conn, "alice@example.com", "secret", false);
    let (_, admin) = create_user(&conn, "admin@example.com", "secret", true);
    let category = create_category(&conn, "Work");
    let tasks = entry_service(&conn, EntryKind::Task);
    let notes = entry_service(&conn, EntryKind::Note);
    let form = EntryForm {
        title: "Survivor".to_string(),
        category_id: Some(category),
        ..EntryForm::default()
    };
    let task = tasks.create_from_form(&alice, &form).unwrap();
    let note = notes.create_from_form(&alice, &form).unwrap();

    UserService::new(SqliteUserRepository::try_new(&conn).unwrap())
        .delete(alice_user.id.unwrap())
        .unwrap();

    let task = tasks.find_one_by_id(task.id).unwrap().unwrap();
    let note = notes.find_one_by_id(note.id).unwrap().unwrap();
    assert_eq!(task.author_id, None);
    assert_eq!(note.author_id, None);
    assert_eq!(
        tasks
            .get_paginated_list(1, &admin, EntryFilterParams::default())
            .unwrap()
            .total_items,
        1
    );
}

#[test]
fn duplicate_email_is_a_validation_error() {
    let conn = open_db_in_memory().unwrap();
    create_user(&conn, "dave@example.com", "secret", false);
    let service = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());

    let err = service
        .create_from_form(
            &UserForm {
                email: "DAVE@example.com".to_string(),
                name: "Dave again".to_string(),
                is_admin: false,
                password: Some("another".to_string()),
            },
            &hasher(),
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::Invalid(errors) if errors.has("email")));
}

#[test]
fn admin_edit_updates_roles_and_password_change_rehashes() {
    let conn = open_db_in_memory().unwrap();
    let (user, _) = create_user(&conn, "erin@example.com", "old-secret", false);
    let id = user.id.unwrap();
    let service = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());
    let hasher = hasher();

    let promoted = service
        .update_from_form(
            id,
            &UserForm {
                email: "erin@example.com".to_string(),
                name: "Erin".to_string(),
                is_admin: true,
                password: None,
            },
            &hasher,
        )
        .unwrap();
    assert!(promoted.has_role(Role::Admin));
    assert_eq!(promoted.password, user.password);

    let changed = service
        .change_password(
            id,
            &PasswordForm {
                password: "new-secret".to_string(),
            },
            &hasher,
        )
        .unwrap();
    assert!(hasher.verify_password(&changed.password, "new-secret"));
    assert!(!hasher.verify_password(&changed.password, "old-secret"));
}

#[test]
fn login_issues_session_and_logout_revokes_it() {
    let conn = open_db_in_memory().unwrap();
    create_user(&conn, "frank@example.com", "secret", false);
    let auth = AuthService::new(
        SqliteUserRepository::try_new(&conn).unwrap(),
        SqliteSessionRepository::try_new(&conn).unwrap(),
    );
    let hasher = hasher();

    assert!(matches!(
        auth.login("frank@example.com", "wrong", &hasher).unwrap_err(),
        ServiceError::InvalidCredentials
    ));
    assert!(matches!(
        auth.login("nobody@example.com", "secret", &hasher).unwrap_err(),
        ServiceError::InvalidCredentials
    ));

    let session = auth.login("frank@example.com", "secret", &hasher).unwrap();
    let current = auth.current_user(&session.token).unwrap().unwrap();
    assert_eq!(current.email, "frank@example.com");

    auth.logout(&session.token).unwrap();
    assert!(auth.current_user(&session.token).unwrap().is_none());
}

#[test]
fn expired_sessions_stop_resolving_and_are_purged_on_next_login() {
    let conn = open_db_in_memory().unwrap();
    create_user(&conn, "hugo@example.com", "secret", false);
    let auth = AuthService::new(
        SqliteUserRepository::try_new(&conn).unwrap(),
        SqliteSessionRepository::try_new(&conn).unwrap(),
    );
    let hasher = hasher();

    let stale = auth.login("hugo@example.com", "secret", &hasher).unwrap();
    conn.execute(
        "UPDATE sessions SET created_at = created_at - ?1 - 1000 WHERE token = ?2;",
        rusqlite::params![SESSION_MAX_AGE_MS, stale.token],
    )
    .unwrap();
    assert!(auth.current_user(&stale.token).unwrap().is_none());

    let fresh = auth.login("hugo@example.com", "secret", &hasher).unwrap();
    assert!(auth.current_user(&fresh.token).unwrap().is_some());
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM sessions;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn registration_creates_regular_user_and_account_update_keeps_blank_password() {
    let conn = open_db_in_memory().unwrap();
    let auth = AuthService::new(
        SqliteUserRepository::try_new(&conn).unwrap(),
        SqliteSessionRepository::try_new(&conn).unwrap(),
    );
    let hasher = hasher();

    let user = auth
        .register(
            &RegistrationForm {
                email: "gina@example.com".to_string(),
                name: "Gina".to_string(),
                password: "first-pass".to_string(),
            },
            &hasher,
        )
        .unwrap();
    assert_eq!(user.roles(), vec![Role::User]);

    let updated = auth
        .update_account(
            user.id.unwrap(),
            &AccountForm {
                email: "gina@example.org".to_string(),
                name: "Gina B.".to_string(),
                password: String::new(),
            },
            &hasher,
        )
        .unwrap();
    assert_eq!(updated.email, "gina@example.org");
    assert_eq!(updated.password, user.password);

    let session = auth.login("gina@example.org", "first-pass", &hasher).unwrap();
    assert_eq!(session.user.id, user.id);
}
