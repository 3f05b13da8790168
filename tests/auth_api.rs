//! HTTP tests for the auth endpoints over an in-memory user store.

use std::sync::Arc;

use axum::http::{header::ACCEPT_LANGUAGE, HeaderValue, StatusCode};
use axum_test::TestServer;
use portfolio_auth::{
    app::build_app,
    auth::{jwt::JwtKeys, repo::MemoryUserStore},
    config::Environment,
    state::AppState,
};
use serde_json::{json, Value};
use time::Duration;

fn create_test_server_with(environment: Environment) -> (TestServer, Arc<MemoryUserStore>, AppState) {
    let store = Arc::new(MemoryUserStore::new());
    let state = AppState::fake_with(store.clone(), environment);
    let server = TestServer::new(build_app(state.clone())).expect("Failed to create test server");
    (server, store, state)
}

fn create_test_server() -> (TestServer, Arc<MemoryUserStore>, AppState) {
    create_test_server_with(Environment::Development)
}

fn alice() -> Value {
    json!({ "username": "alice", "email": "a@x.com", "password": "secret123" })
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_success_sets_verifiable_cookie() {
    let (server, store, state) = create_test_server();

    let response = server.post("/api/auth/register").json(&alice()).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let body: Value = response.json();
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["email"], "a@x.com");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"]["id"].is_string());
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("password_hash").is_none());

    let cookie = response.cookie("token");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.max_age(), Some(Duration::days(7)));
    assert_ne!(cookie.secure(), Some(true));

    let keys = JwtKeys::new(&state.config.jwt);
    let claims = keys.verify(cookie.value()).expect("cookie token verifies");
    assert_eq!(claims.id.to_string(), body["user"]["id"].as_str().unwrap());
    assert_eq!(claims.email, "a@x.com");
    assert_eq!(claims.role, "user");
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_register_production_cookie_is_secure() {
    let (server, _store, _state) = create_test_server_with(Environment::Production);
    let response = server.post("/api/auth/register").json(&alice()).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    assert_eq!(response.cookie("token").secure(), Some(true));
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let (server, store, _state) = create_test_server();
    server.post("/api/auth/register").json(&alice()).await;

    let response = server
        .post("/api/auth/register")
        .json(&json!({ "username": "alice2", "email": "a@x.com", "password": "other-pass" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(response.json::<Value>()["error"], "Email already in use");
    assert!(response.maybe_cookie("token").is_none());
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_register_duplicate_username_conflicts() {
    let (server, store, _state) = create_test_server();
    server.post("/api/auth/register").json(&alice()).await;

    let response = server
        .post("/api/auth/register")
        .json(&json!({ "username": "alice", "email": "b@x.com", "password": "other-pass" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_register_malformed_body_is_bad_request() {
    let (server, store, _state) = create_test_server();

    let missing_field = server
        .post("/api/auth/register")
        .json(&json!({ "email": "a@x.com", "password": "secret123" }))
        .await;
    assert_eq!(missing_field.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(missing_field.json::<Value>()["error"], "Invalid request");

    let not_json = server.post("/api/auth/register").text("username=alice").await;
    assert_eq!(not_json.status_code(), StatusCode::BAD_REQUEST);

    let weak = server
        .post("/api/auth/register")
        .json(&json!({ "username": "alice", "email": "a@x.com", "password": "short" }))
        .await;
    assert_eq!(weak.status_code(), StatusCode::BAD_REQUEST);

    assert!(store.is_empty().await);
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_failures_share_one_shape() {
    let (server, _store, _state) = create_test_server();
    server.post("/api/auth/register").json(&alice()).await;

    let unknown = server
        .post("/api/auth/login")
        .json(&json!({ "email": "nobody@x.com", "password": "secret123" }))
        .await;
    let wrong = server
        .post("/api/auth/login")
        .json(&json!({ "email": "a@x.com", "password": "not-the-password" }))
        .await;

    assert_eq!(unknown.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.json::<Value>(), wrong.json::<Value>());
    assert_eq!(wrong.json::<Value>()["error"], "Invalid credentials");
    assert!(unknown.maybe_cookie("token").is_none());
    assert!(wrong.maybe_cookie("token").is_none());
}

#[tokio::test]
async fn test_login_empty_password_is_invalid_credentials() {
    let (server, _store, _state) = create_test_server();
    server.post("/api/auth/register").json(&alice()).await;

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": "a@x.com", "password": "" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "Invalid credentials");
    assert!(response.maybe_cookie("token").is_none());
}

#[tokio::test]
async fn test_login_missing_fields_is_bad_request() {
    let (server, _store, _state) = create_test_server();
    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": "a@x.com" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Logout and session check
// ============================================================================

#[tokio::test]
async fn test_logout_without_session_succeeds() {
    let (server, _store, _state) = create_test_server();
    let response = server.post("/api/auth/logout").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["message"], "Logged out");

    let cookie = response.cookie("token");
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.max_age(), Some(Duration::ZERO));
}

#[tokio::test]
async fn test_me_without_cookie_is_unauthorized() {
    let (server, _store, _state) = create_test_server();
    let response = server.get("/api/auth/me").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "Unauthorized");
}

#[tokio::test]
async fn test_me_with_tampered_cookie_is_unauthorized() {
    let (server, _store, _state) = create_test_server();
    let register = server.post("/api/auth/register").json(&alice()).await;
    let mut cookie = register.cookie("token");
    let tampered = format!("{}x", cookie.value());
    cookie.set_value(tampered);

    let response = server.get("/api/auth/me").add_cookie(cookie).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_me_for_deleted_user_is_not_found() {
    let (server, store, _state) = create_test_server();
    let register = server.post("/api/auth/register").json(&alice()).await;
    let cookie = register.cookie("token");
    let id = register.json::<Value>()["user"]["id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    store.remove(id).await;

    let response = server.get("/api/auth/me").add_cookie(cookie).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"], "User not found");
}

#[tokio::test]
async fn test_errors_are_localized() {
    let (server, _store, _state) = create_test_server();
    let response = server
        .get("/api/auth/me")
        .add_header(ACCEPT_LANGUAGE, HeaderValue::from_static("fr-FR,fr;q=0.9"))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "Non autorisé");
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test]
async fn test_register_login_me_logout_flow() {
    let (server, _store, _state) = create_test_server();

    let register = server.post("/api/auth/register").json(&alice()).await;
    assert!(register.status_code().is_success());
    let registered: Value = register.json();
    assert_eq!(registered["user"]["email"], "a@x.com");

    let login = server
        .post("/api/auth/login")
        .json(&json!({ "email": "a@x.com", "password": "secret123" }))
        .await;
    assert_eq!(login.status_code(), StatusCode::OK);
    let logged_in: Value = login.json();
    assert_eq!(logged_in["message"], "Login successful");
    assert_eq!(logged_in["user"]["id"], registered["user"]["id"]);
    let session = login.cookie("token");

    let me = server.get("/api/auth/me").add_cookie(session.clone()).await;
    assert_eq!(me.status_code(), StatusCode::OK);
    let profile: Value = me.json();
    assert_eq!(profile["user"]["email"], "a@x.com");
    assert_eq!(profile["user"]["username"], "alice");
    assert!(profile["user"]["createdAt"].is_string());
    assert!(profile["user"].get("passwordHash").is_none());

    let logout = server.post("/api/auth/logout").add_cookie(session).await;
    assert_eq!(logout.status_code(), StatusCode::OK);
    let cleared = logout.cookie("token");

    // the browser now holds the cleared cookie
    let after = server.get("/api/auth/me").add_cookie(cleared).await;
    assert_eq!(after.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health() {
    let (server, _store, _state) = create_test_server();
    let response = server.get("/api/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "ok");
}
