use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::HeaderMap;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use botdesk_core::config::{
    BotdeskConfig, ChatConfig, DatabaseConfig, JwtConfig, LogFormat,
};
use botdesk_core::{AccountStore, NewUser, Role};
use botdesk_server::{AppState, ChatRelay, JwtIdentityProvider, build_router};
use botdesk_storage_sqlite::{SqliteAccountStore, SqliteOnboardingStore, SqliteSubscriberStore};

use crate::stores::{TestStores, create_test_stores};

pub const TEST_ACCESS_SECRET: &str = "test-access-secret-at-least-32-chars-long";
pub const TEST_PUBLIC_URL: &str = "http://botdesk.test";

pub type TestAppState = AppState<SqliteAccountStore, SqliteSubscriberStore, SqliteOnboardingStore>;

pub fn create_test_config(webhook_url: Option<String>) -> BotdeskConfig {
    BotdeskConfig {
        port: 0,
        public_url: TEST_PUBLIC_URL.to_string(),
        jwt: JwtConfig {
            access_secret: TEST_ACCESS_SECRET.to_string(),
        },
        database: DatabaseConfig {
            url: String::new(), // not used; stores are pre-connected
        },
        chat: ChatConfig {
            webhook_url,
            timeout_secs: 5,
        },
        smtp: None,
        tls: None,
        bootstrap_admins: Vec::new(),
        log_format: LogFormat::Pretty,
    }
}

/// An identity provider over the test account store, for issuing sign-in
/// codes that would otherwise only travel by email.
pub fn create_test_identity(stores: &TestStores) -> JwtIdentityProvider<SqliteAccountStore> {
    JwtIdentityProvider::new(Arc::new(stores.account_store.clone()), TEST_ACCESS_SECRET)
}

pub fn create_test_app_state(stores: &TestStores, webhook_url: Option<String>) -> TestAppState {
    let config = create_test_config(webhook_url);
    let account_store = Arc::new(stores.account_store.clone());
    let identity = JwtIdentityProvider::new(account_store.clone(), TEST_ACCESS_SECRET);
    let chat_relay = ChatRelay::new(&config.chat).expect("failed to build chat relay");

    AppState {
        account_store,
        subscriber_store: Arc::new(stores.subscriber_store.clone()),
        onboarding_store: Arc::new(stores.onboarding_store.clone()),
        identity: Arc::new(identity),
        config: Arc::new(config),
        chat_relay,
        email_sender: None,
    }
}

pub fn create_test_router(stores: &TestStores, webhook_url: Option<String>) -> Router {
    build_router(create_test_app_state(stores, webhook_url))
}

pub async fn create_test_router_and_stores() -> (Router, TestStores) {
    let stores = create_test_stores().await;
    let router = create_test_router(&stores, None);
    (router, stores)
}

/// A user created directly in the store, with a valid access token.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub access_token: String,
}

/// Create a user and mint an access token for it.
pub async fn create_user(stores: &TestStores, name: &str) -> TestUser {
    let input = NewUser {
        id: uuid::Uuid::new_v4().to_string(),
        email: format!("{name}@shop.test"),
    };
    let user = stores
        .account_store
        .create_user(&input)
        .await
        .expect("failed to create user");
    let access_token = botdesk_crypto::create_access_token(&user.id, &user.email, TEST_ACCESS_SECRET)
        .expect("failed to mint access token");

    TestUser {
        id: user.id,
        email: user.email,
        access_token,
    }
}

/// Create a user holding the admin role.
pub async fn create_admin(stores: &TestStores, name: &str) -> TestUser {
    let user = create_user(stores, name).await;
    stores
        .account_store
        .grant_role(&user.id, Role::Admin)
        .await
        .expect("failed to grant admin role");
    user
}

fn build_request(
    method: &str,
    uri: &str,
    auth_token: Option<&str>,
    body: Option<Value>,
) -> axum::http::Request<Body> {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);

    if let Some(token) = auth_token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }

    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }

    let req_body = match body {
        Some(b) => Body::from(serde_json::to_vec(&b).unwrap()),
        None => Body::empty(),
    };

    builder.body(req_body).unwrap()
}

/// Send a request through the router and return (status, body_json).
pub async fn send_request(
    router: &Router,
    method: &str,
    uri: &str,
    auth_token: Option<&str>,
    body: Option<Value>,
) -> (u16, Value) {
    let (status, _, json) = send_request_with_headers(router, method, uri, auth_token, body).await;
    (status, json)
}

/// Like [`send_request`], but also hands back the response headers so tests
/// can inspect redirects and cookies.
pub async fn send_request_with_headers(
    router: &Router,
    method: &str,
    uri: &str,
    auth_token: Option<&str>,
    body: Option<Value>,
) -> (u16, HeaderMap, Value) {
    let req = build_request(method, uri, auth_token, body);
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status().as_u16();
    let headers = resp.headers().clone();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();

    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).to_string(),
        ))
    };

    (status, headers, json)
}

/// Header value as a string, or an empty string when absent.
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
