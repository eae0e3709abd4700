#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use marketplace_api::auth::jwt::{JwtConfig, TokenCodec};
use marketplace_api::auth::password::hash_password;
use marketplace_api::auth::session::SessionService;
use marketplace_api::config::ServerConfig;
use marketplace_api::router::build_app_router;
use marketplace_api::state::AppState;
use marketplace_db::models::user::User;
use marketplace_db::repositories::{InMemorySessionStore, JsonUserDirectory};
use tower::ServiceExt;

/// Password shared by every seeded test user.
pub const TEST_PASSWORD: &str = "secret";

/// A running test application plus a handle on its session store.
pub struct TestApp {
    pub router: Router,
    pub sessions: Arc<InMemorySessionStore>,
}

fn test_user(id: i64, username: &str, first_name: &str) -> User {
    User {
        id,
        username: username.to_string(),
        email: format!("{username}@example.com"),
        first_name: first_name.to_string(),
        last_name: "Tester".to_string(),
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
    }
}

/// Configuration used by every test app. Token settings are the defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        users_file: String::new(),
        session_sweep_interval_secs: 3600,
        jwt: JwtConfig::default(),
    }
}

/// Build the production router seeded with the users `alice` (id 1) and
/// `bob` (id 2), backed by a fresh in-memory session store.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let users = Arc::new(JsonUserDirectory::from_users(vec![
        test_user(1, "alice", "Alice"),
        test_user(2, "bob", "Bob"),
    ]));
    let sessions = Arc::new(InMemorySessionStore::new());

    let state = AppState {
        sessions: Arc::new(SessionService::new(
            users,
            sessions.clone(),
            TokenCodec::new(config.jwt.clone()),
        )),
    };

    TestApp {
        router: build_app_router(state, &config),
        sessions,
    }
}

/// Send a GET request.
pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a GET request with a Bearer token.
pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a POST request with a JSON body.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a POST request with a JSON body and a Bearer token.
pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
