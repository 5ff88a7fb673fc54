use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use pretty_assertions::assert_eq;
use uuid::Uuid;

use taskshare::auth::{SessionMiddleware, SessionSettings};
use taskshare::models::User;
use taskshare::routes;
use taskshare::store::{MemoryStore, SessionStore, Store, UserStore};
use taskshare::{AppError, AppState};

const COOKIE: &str = "sid";

fn settings() -> SessionSettings {
    SessionSettings::new(COOKIE, &[42u8; 64], Duration::hours(1))
}

fn app_state(store: Store) -> AppState {
    AppState::new(store, settings()).with_bcrypt_cost(4)
}

async fn init_app(
    state: AppState,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
{
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .wrap(SessionMiddleware)
            .wrap(Logger::default())
            .configure(routes::config),
    )
    .await
}

struct Reply {
    status: StatusCode,
    location: Option<String>,
    session: Option<Cookie<'static>>,
    body: String,
}

async fn send<S, B>(app: &S, req: Request) -> Reply
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let location = resp
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let session = resp
        .response()
        .cookies()
        .find(|c| c.name() == COOKIE)
        .map(|c| c.into_owned());
    let body = String::from_utf8_lossy(&test::read_body(resp).await).into_owned();
    Reply {
        status,
        location,
        session,
        body,
    }
}

fn post_form(uri: &str, form: &[(&str, &str)], session: Option<&Cookie<'static>>) -> Request {
    let mut req = test::TestRequest::post().uri(uri).set_form(form);
    if let Some(cookie) = session {
        req = req.cookie(cookie.clone());
    }
    req.to_request()
}

fn get(uri: &str, session: Option<&Cookie<'static>>) -> Request {
    let mut req = test::TestRequest::get().uri(uri);
    if let Some(cookie) = session {
        req = req.cookie(cookie.clone());
    }
    req.to_request()
}

fn registration<'a>(email: &'a str, password: &'a str, confirm: &'a str) -> [(&'a str, &'a str); 4] {
    [
        ("email", email),
        ("name", "Test User"),
        ("password", password),
        ("passwordConfirmation", confirm),
    ]
}

fn token_of(cookie: &Cookie<'static>) -> String {
    settings()
        .verify(cookie.clone())
        .expect("session cookie carries a valid signature")
}

#[test_log::test(actix_rt::test)]
async fn test_register_and_login_flow() {
    let mem = MemoryStore::new();
    let app = init_app(app_state(Store::from_backend(mem.clone()))).await;

    // Register
    let reply = send(
        &app,
        post_form(
            "/user/register",
            &registration("Flow@Example.com", "Password123!", "Password123!"),
            None,
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER, "body: {}", reply.body);
    assert_eq!(reply.location.as_deref(), Some("/"));
    let first = reply.session.expect("registration sets a session cookie");

    let user = mem
        .find_user_by_email("flow@example.com")
        .await
        .unwrap()
        .expect("user persisted with normalized email");
    assert_ne!(user.password_hash, "Password123!");
    assert_eq!(mem.session_user(&token_of(&first)).await, Some(user.id));

    // The session resolves to the user on the next request.
    let home = send(&app, get("/", Some(&first))).await;
    assert_eq!(home.status, StatusCode::OK);
    assert!(home.body.contains("Welcome, Test User"));

    // Logout destroys the session and clears the cookie.
    let reply = send(&app, get("/user/logout", Some(&first))).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location.as_deref(), Some("/"));
    assert!(reply.session.map(|c| c.value().is_empty()).unwrap_or(false));
    assert_eq!(mem.session_count().await, 0);

    let home = send(&app, get("/", Some(&first))).await;
    assert!(home.body.contains("action=\"/user/login\""));

    // Login with the same credentials creates a new session for the same user.
    let reply = send(
        &app,
        post_form(
            "/user/login",
            &[("email", "flow@example.com"), ("password", "Password123!")],
            None,
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER, "body: {}", reply.body);
    let second = reply.session.expect("login sets a session cookie");
    assert_ne!(token_of(&second), token_of(&first));
    assert_eq!(mem.session_user(&token_of(&second)).await, Some(user.id));
}

#[actix_rt::test]
async fn test_register_with_mismatched_passwords_creates_nothing() {
    let mem = MemoryStore::new();
    let app = init_app(app_state(Store::from_backend(mem.clone()))).await;

    let reply = send(
        &app,
        post_form(
            "/user/register",
            &registration("mismatch@example.com", "Password123!", "Password124!"),
            None,
        ),
    )
    .await;

    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(reply
        .body
        .contains("Password and password confirmation do not match"));
    assert!(reply.session.is_none());
    assert_eq!(mem.user_count().await, 0);
    assert_eq!(mem.session_count().await, 0);
}

#[actix_rt::test]
async fn test_register_rejects_invalid_email() {
    let mem = MemoryStore::new();
    let app = init_app(app_state(Store::from_backend(mem.clone()))).await;

    let reply = send(
        &app,
        post_form(
            "/user/register",
            &registration("not-an-email", "pw", "pw"),
            None,
        ),
    )
    .await;

    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(reply.body.contains("Email address is not valid"));
    assert_eq!(mem.user_count().await, 0);
}

#[actix_rt::test]
async fn test_register_accepts_padded_email() {
    let mem = MemoryStore::new();
    let app = init_app(app_state(Store::from_backend(mem.clone()))).await;

    let reply = send(
        &app,
        post_form(
            "/user/register",
            &registration(" Ada@Example.com ", "pw", "pw"),
            None,
        ),
    )
    .await;

    assert_eq!(reply.status, StatusCode::SEE_OTHER, "body: {}", reply.body);
    assert!(reply.session.is_some());
    assert!(mem
        .find_user_by_email("ada@example.com")
        .await
        .unwrap()
        .is_some());

    let login = send(
        &app,
        post_form(
            "/user/login",
            &[("email", "ada@example.com"), ("password", "pw")],
            None,
        ),
    )
    .await;
    assert_eq!(login.status, StatusCode::SEE_OTHER);
}

#[actix_rt::test]
async fn test_duplicate_registration_is_rejected() {
    let mem = MemoryStore::new();
    let app = init_app(app_state(Store::from_backend(mem.clone()))).await;
    let form = registration("twice@example.com", "pw", "pw");

    let first = send(&app, post_form("/user/register", &form, None)).await;
    assert_eq!(first.status, StatusCode::SEE_OTHER);

    let second = send(&app, post_form("/user/register", &form, None)).await;
    assert_eq!(second.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(second.body.contains("Email already registered"));
    assert!(second.session.is_none());
    assert_eq!(mem.user_count().await, 1);
    assert_eq!(mem.session_count().await, 1);
}

#[actix_rt::test]
async fn test_login_with_unknown_email() {
    let mem = MemoryStore::new();
    let app = init_app(app_state(Store::from_backend(mem.clone()))).await;

    let reply = send(
        &app,
        post_form(
            "/user/login",
            &[("email", "ghost@example.com"), ("password", "whatever")],
            None,
        ),
    )
    .await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert!(reply.body.contains("No user exists with that email"));
    assert!(reply.session.is_none());
    assert_eq!(mem.session_count().await, 0);
}

#[actix_rt::test]
async fn test_login_with_wrong_password() {
    let mem = MemoryStore::new();
    let app = init_app(app_state(Store::from_backend(mem.clone()))).await;
    send(
        &app,
        post_form(
            "/user/register",
            &registration("wrong@example.com", "right", "right"),
            None,
        ),
    )
    .await;
    let sessions_before = mem.session_count().await;

    let reply = send(
        &app,
        post_form(
            "/user/login",
            &[("email", "wrong@example.com"), ("password", "wrong")],
            None,
        ),
    )
    .await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert!(reply.body.contains("Incorrect password"));
    assert!(reply.body.contains("class=\"errors\""));
    assert!(reply.session.is_none());
    assert_eq!(mem.session_count().await, sessions_before);
}

#[actix_rt::test]
async fn test_login_rotates_existing_session() {
    let mem = MemoryStore::new();
    let app = init_app(app_state(Store::from_backend(mem.clone()))).await;
    let registered = send(
        &app,
        post_form(
            "/user/register",
            &registration("rotate@example.com", "pw", "pw"),
            None,
        ),
    )
    .await
    .session
    .unwrap();

    let reply = send(
        &app,
        post_form(
            "/user/login",
            &[("email", "rotate@example.com"), ("password", "pw")],
            Some(&registered),
        ),
    )
    .await;
    let rotated = reply.session.unwrap();

    assert_eq!(mem.session_user(&token_of(&registered)).await, None);
    assert!(mem.session_user(&token_of(&rotated)).await.is_some());
    assert_eq!(mem.session_count().await, 1);
}

#[actix_rt::test]
async fn test_logout_without_session_redirects_home() {
    let app = init_app(app_state(Store::memory())).await;

    let reply = send(&app, get("/user/logout", None)).await;

    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location.as_deref(), Some("/"));
}

#[actix_rt::test]
async fn test_forged_cookie_is_anonymous() {
    let mem = MemoryStore::new();
    let app = init_app(app_state(Store::from_backend(mem.clone()))).await;
    let cookie = send(
        &app,
        post_form(
            "/user/register",
            &registration("forge@example.com", "pw", "pw"),
            None,
        ),
    )
    .await
    .session
    .unwrap();

    // The raw token without its signature is not accepted.
    let forged = Cookie::new(COOKIE, token_of(&cookie));
    let home = send(&app, get("/", Some(&forged))).await;
    assert!(home.body.contains("action=\"/user/login\""));

    let reply = send(
        &app,
        post_form("/task/create", &[("name", "x")], Some(&forged)),
    )
    .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
}

/// Delegates to a `MemoryStore` but can be told to fail session lookups.
#[derive(Clone, Default)]
struct BrokenSessions {
    inner: MemoryStore,
    failing: Arc<AtomicBool>,
}

#[async_trait]
impl SessionStore for BrokenSessions {
    async fn create_session(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.inner.create_session(token, user_id, expires_at).await
    }

    async fn find_session_user(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError("connection refused".into()));
        }
        self.inner.find_session_user(token, now).await
    }

    async fn destroy_session(&self, token: &str) -> Result<(), AppError> {
        self.inner.destroy_session(token).await
    }
}

#[async_trait]
impl UserStore for BrokenSessions {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        self.inner.insert_user(user).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.inner.find_user_by_id(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.inner.find_user_by_email(email).await
    }
}

#[actix_rt::test]
async fn test_session_store_failure_leaves_request_anonymous() {
    let broken = BrokenSessions::default();
    let store = Store {
        users: Arc::new(broken.clone()),
        tasks: Arc::new(broken.inner.clone()),
        sessions: Arc::new(broken.clone()),
    };
    let app = init_app(app_state(store)).await;
    let cookie = send(
        &app,
        post_form(
            "/user/register",
            &registration("flaky@example.com", "pw", "pw"),
            None,
        ),
    )
    .await
    .session
    .unwrap();

    broken.failing.store(true, Ordering::SeqCst);

    let home = send(&app, get("/", Some(&cookie))).await;
    assert_eq!(home.status, StatusCode::OK);
    assert!(home.body.contains("action=\"/user/login\""));

    let gated = send(
        &app,
        post_form("/task/create", &[("name", "x")], Some(&cookie)),
    )
    .await;
    assert_eq!(gated.status, StatusCode::FORBIDDEN);

    broken.failing.store(false, Ordering::SeqCst);
    let home = send(&app, get("/", Some(&cookie))).await;
    assert!(home.body.contains("Welcome, Test User"));
}

/// Delegates to a `MemoryStore` but can be told to fail user reads or writes.
#[derive(Clone, Default)]
struct BrokenUsers {
    inner: MemoryStore,
    failing_reads: Arc<AtomicBool>,
    failing_writes: Arc<AtomicBool>,
}

#[async_trait]
impl UserStore for BrokenUsers {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError("disk full".into()));
        }
        self.inner.insert_user(user).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.inner.find_user_by_id(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError("connection refused".into()));
        }
        self.inner.find_user_by_email(email).await
    }
}

#[actix_rt::test]
async fn test_user_store_failure_during_registration() {
    let broken = BrokenUsers::default();
    let store = Store {
        users: Arc::new(broken.clone()),
        tasks: Arc::new(broken.inner.clone()),
        sessions: Arc::new(broken.inner.clone()),
    };
    let app = init_app(app_state(store)).await;
    let form = registration("lost@example.com", "pw", "pw");

    broken.failing_writes.store(true, Ordering::SeqCst);
    let reply = send(&app, post_form("/user/register", &form, None)).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(reply.body.contains("Error registering you!"));
    assert!(!reply.body.contains("disk full"));
    assert!(reply.session.is_none());
    assert_eq!(broken.inner.user_count().await, 0);
    assert_eq!(broken.inner.session_count().await, 0);

    broken.failing_writes.store(false, Ordering::SeqCst);
    broken.failing_reads.store(true, Ordering::SeqCst);
    let reply = send(&app, post_form("/user/register", &form, None)).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(reply.body.contains("Error registering you!"));
    assert!(reply.session.is_none());
    assert_eq!(broken.inner.user_count().await, 0);
    assert_eq!(broken.inner.session_count().await, 0);
}
