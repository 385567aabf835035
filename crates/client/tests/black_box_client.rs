use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration as ChronoDuration, Utc};
use igaku_auth::{InMemoryCredentialStore, RecordingNavigator, RouteGuard, SessionContext, Surface};
use igaku_client::views::{HomeView, LoginView, ProfileSource, ProfileView, RegisterView, UsersView};
use igaku_client::{
    ApiClient, AppContext, ClientConfig, ConnectivityState, LoginCredentials, ProfileSnapshotCache,
    RegistrationFields, UserData, UserListQuery, UserOrderField, ViewOutcome,
};
use igaku_core::SortOrder;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::json;

const STUB_SECRET: &str = "stub-secret";

#[derive(Clone, Default)]
struct StubState {
    seen_auth: Arc<Mutex<Vec<String>>>,
    seen_queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl StubState {
    fn record_auth(&self, headers: &HeaderMap) {
        let value = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.seen_auth.lock().unwrap().push(value);
    }

    fn seen_auth(&self) -> Vec<String> {
        self.seen_auth.lock().unwrap().clone()
    }
}

struct TestServer {
    base_url: String,
    state: StubState,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let state = StubState::default();
        let app = Router::new()
            .route("/auth/login/", post(login))
            .route("/auth/register/", post(register))
            .route("/user/self/", get(profile))
            .route("/user/list/", get(list_users))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            state,
            handle,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(expires_in: ChronoDuration, role: Option<&str>) -> String {
    let exp = (Utc::now() + expires_in).timestamp();
    let claims = match role {
        Some(role) => json!({ "sub": "42", "exp": exp, "role": role }),
        None => json!({ "sub": "42", "exp": exp }),
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(STUB_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

async fn login(Json(body): Json<serde_json::Value>) -> Response {
    if body["username"] == "jdoe" && body["password"] == "hunter2" {
        (StatusCode::OK, mint_jwt(ChronoDuration::hours(1), Some("patient"))).into_response()
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}

async fn register(Json(body): Json<serde_json::Value>) -> Response {
    match body["username"].as_str() {
        Some("taken") => StatusCode::CONFLICT.into_response(),
        Some("boom") => (StatusCode::INTERNAL_SERVER_ERROR, "database down").into_response(),
        _ => (StatusCode::OK, mint_jwt(ChronoDuration::hours(1), Some("patient"))).into_response(),
    }
}

// The API reads the whole header value as the token.
fn authorized(headers: &HeaderMap) -> bool {
    let raw = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    jsonwebtoken::decode::<serde_json::Value>(
        raw,
        &DecodingKey::from_secret(STUB_SECRET.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .is_ok()
}

async fn profile(State(state): State<StubState>, headers: HeaderMap) -> Response {
    state.record_auth(&headers);
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" }))).into_response();
    }
    Json(json!({
        "id": uuid::Uuid::now_v7(),
        "username": "jdoe",
        "email": "jdoe@igaku.io",
        "role": "patient",
    }))
    .into_response()
}

async fn list_users(
    State(state): State<StubState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.record_auth(&headers);
    state.seen_queries.lock().unwrap().push(params.clone());
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Unauthorized" }))).into_response();
    }

    let page = params.get("page").cloned().unwrap_or_default();
    match page.as_str() {
        "400" => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "message": "Invalid page parameter." })))
                .into_response();
        }
        "401" => {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Token has expired" })))
                .into_response();
        }
        "403" => {
            return (StatusCode::FORBIDDEN, Json(json!({ "message": "Insufficient permissions" })))
                .into_response();
        }
        "2" => tokio::time::sleep(Duration::from_millis(300)).await,
        _ => {}
    }

    Json(json!({
        "data": [
            { "username": "alice", "email": "alice@igaku.io", "role": "admin" },
            { "username": "bob, jr", "email": "bob@igaku.io", "role": "doctor" },
        ],
        "page": page.parse::<u32>().unwrap_or(1),
        "page_size": 10,
        "total_pages": 1,
        "total_count": 2,
    }))
    .into_response()
}

fn app(base_url: &str, token: Option<String>) -> (AppContext, Arc<RecordingNavigator>) {
    let session = match token {
        Some(token) => SessionContext::new(Arc::new(InMemoryCredentialStore::with_token(token))),
        None => SessionContext::in_memory(),
    };
    app_with_session(base_url, session)
}

fn app_with_session(base_url: &str, session: SessionContext) -> (AppContext, Arc<RecordingNavigator>) {
    let config = ClientConfig::new(base_url, std::env::temp_dir())
        .unwrap()
        .with_timeout(Duration::from_secs(2));
    let navigator = Arc::new(RecordingNavigator::new());
    let guard = RouteGuard::new(session, navigator.clone());

    (AppContext::new(guard, ApiClient::new(&config).unwrap()), navigator)
}

fn page(n: u32) -> UserListQuery {
    UserListQuery::new(n, 10, UserOrderField::Id, SortOrder::Asc).unwrap()
}

/// Base url of a port nothing listens on.
async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

#[tokio::test]
async fn profile_without_token_redirects_to_login() {
    let srv = TestServer::spawn().await;
    let (ctx, navigator) = app(&srv.base_url, None);

    let outcome = ProfileView::new(ctx).render().await;

    assert_eq!(outcome.redirected_to(), Some(Surface::Login));
    assert_eq!(navigator.last().as_deref(), Some("/auth/login"));
    assert!(srv.state.seen_auth().is_empty());
}

#[tokio::test]
async fn user_list_with_non_admin_role_redirects_to_unauthorized() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(ChronoDuration::hours(1), Some("user"));
    let (ctx, navigator) = app(&srv.base_url, Some(token));

    let outcome = UsersView::new(ctx).render(&page(1)).await;

    assert_eq!(outcome.redirected_to(), Some(Surface::Unauthorized));
    assert_eq!(navigator.redirects(), vec!["/unauthorized".to_string()]);
    assert!(srv.state.seen_auth().is_empty());
}

#[tokio::test]
async fn user_list_with_admin_role_fetches_with_raw_token_header() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(ChronoDuration::hours(1), Some("admin"));
    let (ctx, navigator) = app(&srv.base_url, Some(token.clone()));

    let users = UsersView::new(ctx).render(&page(1)).await.ready().unwrap();

    assert_eq!(users.data.len(), 2);
    assert_eq!(users.total_count, 2);
    assert!(navigator.redirects().is_empty());
    assert_eq!(srv.state.seen_auth(), vec![token.clone()]);

    let queries = srv.state.seen_queries.lock().unwrap().clone();
    assert_eq!(queries[0].get("pageSize").map(String::as_str), Some("10"));
    assert_eq!(queries[0].get("orderBy").map(String::as_str), Some("id"));
    assert_eq!(queries[0].get("orderMethod").map(String::as_str), Some("asc"));
}

#[tokio::test]
async fn login_surface_with_expired_token_does_not_redirect() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(ChronoDuration::hours(-1), Some("admin"));
    let (ctx, navigator) = app(&srv.base_url, Some(token));

    let outcome = LoginView::new(ctx).render();

    assert!(outcome.is_ready());
    assert!(navigator.redirects().is_empty());
}

#[tokio::test]
async fn login_surface_with_live_token_redirects_home() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(ChronoDuration::hours(1), Some("patient"));
    let (ctx, navigator) = app(&srv.base_url, Some(token));

    assert_eq!(RegisterView::new(ctx).render().redirected_to(), Some(Surface::Home));
    assert_eq!(navigator.last().as_deref(), Some("/"));
}

#[tokio::test]
async fn home_with_expired_token_redirects_to_login() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(ChronoDuration::minutes(-5), Some("admin"));
    let (ctx, _navigator) = app(&srv.base_url, Some(token));

    assert_eq!(HomeView::new(ctx).render().redirected_to(), Some(Surface::Login));
}

#[tokio::test]
async fn successful_login_stores_token_and_goes_home() {
    let srv = TestServer::spawn().await;
    let (ctx, navigator) = app(&srv.base_url, None);
    let view = LoginView::new(ctx.clone());

    let outcome = view.submit(&LoginCredentials::new("jdoe", "hunter2")).await;

    assert_eq!(outcome.redirected_to(), Some(Surface::Home));
    assert_eq!(navigator.last().as_deref(), Some("/"));
    assert!(ctx.session().state().is_authenticated());
    assert!(HomeView::new(ctx).render().is_ready());
}

#[tokio::test]
async fn failed_login_and_registration_messages() {
    let srv = TestServer::spawn().await;
    let (ctx, navigator) = app(&srv.base_url, None);

    let wrong = LoginView::new(ctx.clone())
        .submit(&LoginCredentials::new("jdoe", "nope"))
        .await;
    assert_eq!(wrong.error().unwrap().user_message(), "Invalid username or password");

    let register = RegisterView::new(ctx.clone());
    let taken = register
        .submit(&RegistrationFields::new("taken", "t@igaku.io", "pw"))
        .await;
    assert_eq!(taken.error().unwrap().user_message(), "Username or Email already taken");

    let broken = register
        .submit(&RegistrationFields::new("boom", "b@igaku.io", "pw"))
        .await;
    assert_eq!(broken.error().unwrap().user_message(), "Something went wrong");

    assert!(ctx.session().token().is_none());
    assert!(navigator.redirects().is_empty());
}

#[tokio::test]
async fn authorization_failures_have_distinct_messages() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(ChronoDuration::hours(1), Some("admin"));
    let (ctx, _navigator) = app(&srv.base_url, Some(token));
    let view = UsersView::new(ctx);

    let mut messages = Vec::new();
    for status in [400, 401, 403] {
        let outcome = view.render(&page(status)).await;
        messages.push(outcome.error().unwrap().user_message());
    }

    assert_ne!(messages[0], messages[1]);
    assert_ne!(messages[1], messages[2]);
    assert_ne!(messages[0], messages[2]);
}

#[tokio::test]
async fn export_renders_csv_rows() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(ChronoDuration::hours(1), Some("admin"));
    let (ctx, _navigator) = app(&srv.base_url, Some(token));

    let csv = UsersView::new(ctx).export(&page(1)).await.ready().unwrap();

    assert_eq!(csv, "alice,alice@igaku.io,admin\n\"bob, jr\",bob@igaku.io,doctor\n");
}

#[tokio::test]
async fn newer_fetch_supersedes_slower_one() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(ChronoDuration::hours(1), Some("admin"));
    let (ctx, _navigator) = app(&srv.base_url, Some(token));
    let view = UsersView::new(ctx);

    let slow_query = page(2);
    let fast_query = page(1);
    let (slow, fast) = tokio::join!(view.render(&slow_query), view.render(&fast_query));

    assert!(matches!(slow, ViewOutcome::Superseded));
    assert_eq!(fast.ready().unwrap().page, 1);
}

#[tokio::test]
async fn leaving_the_view_discards_in_flight_response() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(ChronoDuration::hours(1), Some("admin"));
    let (ctx, _navigator) = app(&srv.base_url, Some(token));
    let view = UsersView::new(ctx);

    let slow_query = page(2);
    let (outcome, ()) = tokio::join!(view.render(&slow_query), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        view.leave();
    });

    assert!(matches!(outcome, ViewOutcome::Superseded));
}

#[tokio::test]
async fn profile_is_cached_and_served_while_offline() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(ChronoDuration::hours(1), Some("patient"));
    let cache = ProfileSnapshotCache::in_memory().await.unwrap();

    let (online, _navigator) = app(&srv.base_url, Some(token.clone()));
    let online = online.with_cache(cache.clone());
    let live = ProfileView::new(online).render().await.ready().unwrap();
    assert!(live.is_live());
    assert_eq!(srv.state.seen_auth(), vec![token.clone()]);

    let (offline, _navigator) = app(&unreachable_base_url().await, Some(token));
    let offline = offline.with_cache(cache);
    let shown = ProfileView::new(offline.clone()).render().await.ready().unwrap();

    assert!(matches!(shown.source, ProfileSource::Snapshot { .. }));
    assert_eq!(shown.profile, live.profile);
    assert_eq!(offline.connectivity(), ConnectivityState::Offline);
}

#[tokio::test]
async fn offline_without_snapshot_reports_unreachable() {
    let token = mint_jwt(ChronoDuration::hours(1), Some("patient"));
    let (ctx, _navigator) = app(&unreachable_base_url().await, Some(token));
    let ctx = ctx.with_cache(ProfileSnapshotCache::in_memory().await.unwrap());

    let outcome = ProfileView::new(ctx).render().await;

    assert_eq!(outcome.error().unwrap().user_message(), "Unable to reach the server");
}

#[tokio::test]
async fn sign_out_clears_session_and_snapshot() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(ChronoDuration::hours(1), Some("patient"));
    let cache = ProfileSnapshotCache::in_memory().await.unwrap();
    let (ctx, navigator) = app(&srv.base_url, Some(token));
    let ctx = ctx.with_cache(cache.clone());

    ProfileView::new(ctx.clone()).render().await.ready().unwrap();
    assert!(cache.load(None).await.unwrap().is_some());

    ctx.sign_out().await.unwrap();

    assert!(ctx.session().token().is_none());
    assert!(cache.load(None).await.unwrap().is_none());
    assert_eq!(navigator.last().as_deref(), Some("/auth/login"));
}

#[tokio::test]
async fn new_sign_in_drops_previous_profile_snapshot() {
    let srv = TestServer::spawn().await;
    let cache = ProfileSnapshotCache::in_memory().await.unwrap();
    let alice = UserData {
        id: None,
        username: "alice".to_string(),
        email: "alice@igaku.io".to_string(),
        role: igaku_auth::Role::ADMIN,
    };
    cache.store(&alice).await.unwrap();

    // alice's session expired without a sign-out; jdoe signs in next.
    let expired = mint_jwt(ChronoDuration::hours(-1), Some("admin"));
    let session = SessionContext::new(Arc::new(InMemoryCredentialStore::with_token(expired)));
    let (online, _navigator) = app_with_session(&srv.base_url, session.clone());
    let online = online.with_cache(cache.clone());
    let outcome = LoginView::new(online)
        .submit(&LoginCredentials::new("jdoe", "hunter2"))
        .await;
    assert_eq!(outcome.redirected_to(), Some(Surface::Home));
    assert!(cache.load(None).await.unwrap().is_none());

    let (offline, _navigator) = app_with_session(&unreachable_base_url().await, session);
    let offline = offline.with_cache(cache);
    let shown = ProfileView::new(offline).render().await;

    assert_eq!(shown.error().unwrap().user_message(), "Unable to reach the server");
}

#[tokio::test]
async fn prefixed_authorization_header_is_rejected_by_api() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(ChronoDuration::hours(1), Some("patient"));
    let (ctx, _navigator) = app(&srv.base_url, Some(token.clone()));

    let shown = ProfileView::new(ctx).render().await.ready().unwrap();
    assert_eq!(shown.profile.username, "jdoe");
    assert!(!srv.state.seen_auth()[0].starts_with("Bearer "));

    let rejected = reqwest::Client::new()
        .get(format!("{}/user/self/", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), reqwest::StatusCode::UNAUTHORIZED);
}

#[test]
fn user_data_from_list_payload() {
    let user: UserData =
        serde_json::from_str(r#"{"username":"alice","email":"alice@igaku.io","role":"admin"}"#).unwrap();
    assert!(user.role.is_admin());
}
