use axum::body::{to_bytes, Body};
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tasknotes_core::db::open_db;
use tasknotes_core::form::EntryForm;
use tasknotes_core::model::category::Category;
use tasknotes_core::model::tag::Tag;
use tasknotes_core::model::user::{Role, User};
use tasknotes_core::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use tasknotes_core::repo::entry_repo::SqliteEntryRepository;
use tasknotes_core::repo::tag_repo::{SqliteTagRepository, TagRepository};
use tasknotes_core::repo::user_repo::{SqliteUserRepository, UserRepository};
use tasknotes_core::security::{Argon2PasswordHasher, PasswordHasher, Viewer};
use tasknotes_core::service::entry_service::EntryService;
use tasknotes_core::{EntryId, EntryKind};
use tasknotes_web::{build_router, AppState};
use tempfile::TempDir;
use tower::ServiceExt;

const PASSWORD: &str = "secret-pass";

struct TestApp {
    _dir: TempDir,
    state: AppState,
}

impl TestApp {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let state = AppState::new(
            dir.path().join("app.sqlite3"),
            Argon2PasswordHasher::low_cost(),
        )
        .unwrap();
        Self { _dir: dir, state }
    }

    fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    fn add_user(&self, email: &str, admin: bool) -> Viewer {
        let conn = open_db(self.state.db_path()).unwrap();
        let mut user = User::new(email, "Test user");
        if admin {
            user.set_roles([Role::User, Role::Admin]);
        }
        user.password = Argon2PasswordHasher::low_cost()
            .hash_password(PASSWORD)
            .unwrap();
        SqliteUserRepository::try_new(&conn)
            .unwrap()
            .save(&mut user)
            .unwrap();
        Viewer::from_user(&user).unwrap()
    }

    fn add_category(&self, title: &str) -> i64 {
        let conn = open_db(self.state.db_path()).unwrap();
        SqliteCategoryRepository::try_new(&conn)
            .unwrap()
            .save(&mut Category::new(title))
            .unwrap()
    }

    fn add_tag(&self, title: &str) -> i64 {
        let conn = open_db(self.state.db_path()).unwrap();
        SqliteTagRepository::try_new(&conn)
            .unwrap()
            .save(&mut Tag::new(title))
            .unwrap()
    }

    fn add_task(&self, author: &Viewer, title: &str, category_id: i64) -> EntryId {
        let conn = open_db(self.state.db_path()).unwrap();
        let service = EntryService::new(
            SqliteEntryRepository::try_new(&conn, EntryKind::Task).unwrap(),
            SqliteCategoryRepository::try_new(&conn).unwrap(),
            SqliteTagRepository::try_new(&conn).unwrap(),
        );
        let form = EntryForm {
            title: title.to_string(),
            content: "body".to_string(),
            category_id: Some(category_id),
            tags: String::new(),
        };
        service.create_from_form(author, &form).unwrap().id
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router().oneshot(request).await.unwrap()
    }

    /// Signs in and returns the `Cookie` header value for later requests.
    async fn login(&self, email: &str) -> String {
        let response = self
            .send(form_request(
                "/login",
                None,
                &format!("email={}&password={PASSWORD}", email.replace('@', "%40")),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with("tasknotes_session="))
            .unwrap();
        cookie.split(';').next().unwrap().to_string()
    }
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn form_request(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers().get(LOCATION).unwrap().to_str().unwrap()
}

fn sets_cookie(response: &Response, prefix: &str) -> bool {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.starts_with(prefix))
}

#[tokio::test]
async fn anonymous_requests_are_sent_to_login() {
    let app = TestApp::new();

    let response = app.send(get("/task", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let page = app.send(get("/login", None)).await;
    assert_eq!(page.status(), StatusCode::OK);
    assert!(body_text(page).await.contains("Sign in"));
}

#[tokio::test]
async fn login_rejects_bad_password_and_accepts_good_one() {
    let app = TestApp::new();
    app.add_user("alice@example.com", false);

    let rejected = app
        .send(form_request(
            "/login",
            None,
            "email=alice%40example.com&password=wrong-pass",
        ))
        .await;
    assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_text(rejected).await;
    assert!(body.contains("Invalid credentials."));
    assert!(body.contains("alice@example.com"));

    let cookie = app.login("alice@example.com").await;
    let tasks = app.send(get("/task", Some(&cookie))).await;
    assert_eq!(tasks.status(), StatusCode::OK);

    let logout = app.send(get("/logout", Some(&cookie))).await;
    assert_eq!(logout.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&logout), "/login");
    let after = app.send(get("/task", Some(&cookie))).await;
    assert_eq!(after.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn task_list_shows_only_own_entries_to_regular_users() {
    let app = TestApp::new();
    let alice = app.add_user("alice@example.com", false);
    let bob = app.add_user("bob@example.com", false);
    app.add_user("admin@example.com", true);
    let category = app.add_category("Work");
    app.add_task(&alice, "Alice errand", category);
    app.add_task(&bob, "Bob errand", category);

    let alice_cookie = app.login("alice@example.com").await;
    let body = body_text(app.send(get("/task", Some(&alice_cookie))).await).await;
    assert!(body.contains("Alice errand"));
    assert!(!body.contains("Bob errand"));

    let admin_cookie = app.login("admin@example.com").await;
    let body = body_text(app.send(get("/task", Some(&admin_cookie))).await).await;
    assert!(body.contains("Alice errand"));
    assert!(body.contains("Bob errand"));
}

#[tokio::test]
async fn malformed_filters_are_ignored() {
    let app = TestApp::new();
    let alice = app.add_user("alice@example.com", false);
    let work = app.add_category("Work");
    let home = app.add_category("Home");
    app.add_task(&alice, "Office errand", work);
    app.add_task(&alice, "Kitchen errand", home);
    let cookie = app.login("alice@example.com").await;

    for uri in ["/task?category_id=abc", "/task?tag_id=x", "/task?category_id=&tag_id=9999"] {
        let response = app.send(get(uri, Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let body = body_text(response).await;
        assert!(body.contains("Office errand"), "{uri}");
        assert!(body.contains("Kitchen errand"), "{uri}");
    }

    let filtered = body_text(
        app.send(get(&format!("/task?category_id={work}"), Some(&cookie)))
            .await,
    )
    .await;
    assert!(filtered.contains("Office errand"));
    assert!(!filtered.contains("Kitchen errand"));
}

#[tokio::test]
async fn foreign_entries_are_forbidden_and_bad_ids_not_found() {
    let app = TestApp::new();
    app.add_user("alice@example.com", false);
    let bob = app.add_user("bob@example.com", false);
    let category = app.add_category("Work");
    let bob_task = app.add_task(&bob, "Bob errand", category);

    let cookie = app.login("alice@example.com").await;
    for uri in [
        format!("/task/{bob_task}"),
        format!("/task/{bob_task}/edit"),
        format!("/task/{bob_task}/delete"),
    ] {
        let response = app.send(get(&uri, Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
    }

    for uri in ["/task/0", "/task/abc", "/task/007", "/note/999"] {
        let response = app.send(get(uri, Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }

    // Tasks and notes are separate lists.
    let response = app.send(get(&format!("/note/{bob_task}"), Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn creating_a_task_redirects_with_flash() {
    let app = TestApp::new();
    app.add_user("alice@example.com", false);
    let category = app.add_category("Work");
    let cookie = app.login("alice@example.com").await;

    let invalid = app
        .send(form_request(
            "/task/create",
            Some(&cookie),
            "title=ab&content=x&category_id=&tags=",
        ))
        .await;
    assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(invalid).await.contains("Choose a category."));

    let created = app
        .send(form_request(
            "/task/create",
            Some(&cookie),
            &format!("title=Buy+milk&content=two+litres&category_id={category}&tags=shopping"),
        ))
        .await;
    assert_eq!(created.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&created), "/task");
    assert!(sets_cookie(&created, "tasknotes_flash=created_successfully"));

    let list_cookie = format!("{cookie}; tasknotes_flash=created_successfully");
    let list = app.send(get("/task", Some(&list_cookie))).await;
    assert!(sets_cookie(&list, "tasknotes_flash=;"));
    let body = body_text(list).await;
    assert!(body.contains("Buy milk"));
    assert!(body.contains("shopping"));
    assert!(body.contains("Created successfully."));
}

#[tokio::test]
async fn admin_pages_reject_regular_users() {
    let app = TestApp::new();
    app.add_user("alice@example.com", false);
    let cookie = app.login("alice@example.com").await;

    for uri in ["/user", "/user/create", "/category/create", "/tag/create"] {
        let response = app.send(get(uri, Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
    }
    assert_eq!(
        app.send(get("/category", Some(&cookie))).await.status(),
        StatusCode::OK
    );

    let tag = app.add_tag("errands");
    let writes = [
        form_request("/tag/create", Some(&cookie), "title=sneaky"),
        form_request(&format!("/tag/{tag}/edit"), Some(&cookie), "title=renamed"),
        form_request(&format!("/tag/{tag}/delete"), Some(&cookie), ""),
    ];
    for request in writes {
        assert_eq!(app.send(request).await.status(), StatusCode::FORBIDDEN);
    }
    let body = body_text(app.send(get(&format!("/tag/{tag}"), Some(&cookie))).await).await;
    assert!(body.contains("errands"));
    assert!(!body.contains("renamed"));
}

#[tokio::test]
async fn duplicate_tag_is_rejected_with_form_error() {
    let app = TestApp::new();
    app.add_user("admin@example.com", true);
    app.add_tag("urgent");
    let cookie = app.login("admin@example.com").await;

    let response = app
        .send(form_request("/tag/create", Some(&cookie), "title=Urgent"))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("This value is already used."));

    let created = app
        .send(form_request("/tag/create", Some(&cookie), "title=someday"))
        .await;
    assert_eq!(created.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&created), "/tag");
}

#[tokio::test]
async fn category_in_use_is_not_deleted() {
    let app = TestApp::new();
    let admin = app.add_user("admin@example.com", true);
    let used = app.add_category("Work");
    let unused = app.add_category("Hobby");
    app.add_task(&admin, "Report", used);
    let cookie = app.login("admin@example.com").await;

    let refused = app
        .send(form_request(&format!("/category/{used}/delete"), Some(&cookie), ""))
        .await;
    assert_eq!(refused.status(), StatusCode::SEE_OTHER);
    assert!(sets_cookie(&refused, "tasknotes_flash=category_in_use"));
    assert_eq!(
        app.send(get(&format!("/category/{used}"), Some(&cookie)))
            .await
            .status(),
        StatusCode::OK
    );

    let deleted = app
        .send(form_request(&format!("/category/{unused}/delete"), Some(&cookie), ""))
        .await;
    assert!(sets_cookie(&deleted, "tasknotes_flash=deleted_successfully"));
    assert_eq!(
        app.send(get(&format!("/category/{unused}"), Some(&cookie)))
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn users_can_edit_only_their_own_profile() {
    let app = TestApp::new();
    let alice = app.add_user("alice@example.com", false);
    let bob = app.add_user("bob@example.com", false);
    let cookie = app.login("alice@example.com").await;

    let own = app
        .send(get(&format!("/user/{}/edit", alice.id), Some(&cookie)))
        .await;
    assert_eq!(own.status(), StatusCode::OK);
    let foreign = app
        .send(get(&format!("/user/{}/edit", bob.id), Some(&cookie)))
        .await;
    assert_eq!(foreign.status(), StatusCode::FORBIDDEN);

    // A regular user cannot promote themselves.
    let edited = app
        .send(form_request(
            &format!("/user/{}/edit", alice.id),
            Some(&cookie),
            "email=alice%40example.com&name=Alice&is_admin=true",
        ))
        .await;
    assert_eq!(edited.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&edited), format!("/user/{}", alice.id));
    let conn = open_db(app.state.db_path()).unwrap();
    let stored = SqliteUserRepository::try_new(&conn)
        .unwrap()
        .find_one_by_id(alice.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "Alice");
    assert!(!stored.is_admin());
}
