use botdesk_core::{AccountStore, ImpersonationToken};
use botdesk_test_utils::*;
use chrono::{Duration, Utc};
use serde_json::json;

const INVALID_LINK: &str = "http://botdesk.test/?toast=impersonation_invalid";

/// Issue a link as `admin` for `target_id` and return the path part.
async fn issue_link(router: &axum::Router, admin: &TestUser, target_id: &str) -> String {
    let (status, body) = send_request(
        router,
        "POST",
        "/api/admin/impersonate",
        Some(&admin.access_token),
        Some(json!({ "target_user_id": target_id })),
    )
    .await;
    assert_api_ok(status, &body);

    let login_url = body["login_url"].as_str().unwrap();
    let path = login_url
        .strip_prefix(TEST_PUBLIC_URL)
        .expect("login url should start with the public url");
    assert!(path.starts_with("/impersonate/"));
    path.to_string()
}

fn session_token_from_cookie(set_cookie: &str) -> String {
    let (pair, attrs) = set_cookie.split_once(';').unwrap();
    assert!(attrs.contains("HttpOnly"));
    assert!(attrs.contains("Path=/"));
    pair.strip_prefix("botdesk_session=")
        .expect("cookie should carry the session")
        .to_string()
}

#[tokio::test]
async fn admin_link_signs_in_as_target_once() {
    let (router, stores) = create_test_router_and_stores().await;
    let admin = create_admin(&stores, "admin").await;
    let target = create_user(&stores, "owner").await;

    let path = issue_link(&router, &admin, &target.id).await;

    let (status, headers, _) = send_request_with_headers(&router, "GET", &path, None, None).await;
    assert_eq!(status, 303);
    assert_eq!(header_str(&headers, "location"), "http://botdesk.test/dashboard");

    let token = session_token_from_cookie(header_str(&headers, "set-cookie"));
    let (status, session) =
        send_request(&router, "GET", "/api/auth/session", Some(&token), None).await;
    assert_api_ok(status, &session);
    assert_eq!(session["user_id"], target.id.as_str());
    assert_eq!(session["email"], "owner@shop.test");
    assert_eq!(session["is_admin"], false);

    // Second redemption of the same link is refused.
    let (status, headers, _) = send_request_with_headers(&router, "GET", &path, None, None).await;
    assert_eq!(status, 303);
    assert_eq!(header_str(&headers, "location"), INVALID_LINK);
    assert!(headers.get("set-cookie").is_none());
}

#[tokio::test]
async fn redemption_marks_token_used() {
    let (router, stores) = create_test_router_and_stores().await;
    let admin = create_admin(&stores, "admin").await;
    let target = create_user(&stores, "owner").await;

    let path = issue_link(&router, &admin, &target.id).await;
    let token = path.trim_start_matches("/impersonate/");

    let before = stores
        .account_store
        .get_impersonation_token(token)
        .await
        .unwrap()
        .unwrap();
    assert!(before.used_at.is_none());
    assert_eq!(before.admin_id, admin.id);
    let ttl = before.expires_at - before.created_at;
    assert_eq!(ttl, Duration::minutes(10));

    send_request_with_headers(&router, "GET", &path, None, None).await;

    let after = stores
        .account_store
        .get_impersonation_token(token)
        .await
        .unwrap()
        .unwrap();
    assert!(after.used_at.is_some());
}

#[tokio::test]
async fn expired_link_is_rejected() {
    let (router, stores) = create_test_router_and_stores().await;
    let admin = create_admin(&stores, "admin").await;
    let target = create_user(&stores, "owner").await;

    let now = Utc::now();
    stores
        .account_store
        .create_impersonation_token(&ImpersonationToken {
            token: "stale-token".to_string(),
            target_user_id: target.id.clone(),
            admin_id: admin.id.clone(),
            expires_at: now - Duration::minutes(1),
            used_at: None,
            created_at: now - Duration::minutes(11),
        })
        .await
        .unwrap();

    let (status, headers, _) =
        send_request_with_headers(&router, "GET", "/impersonate/stale-token", None, None).await;
    assert_eq!(status, 303);
    assert_eq!(header_str(&headers, "location"), INVALID_LINK);
}

#[tokio::test]
async fn unknown_link_is_rejected() {
    let (router, _stores) = create_test_router_and_stores().await;
    let (status, headers, _) =
        send_request_with_headers(&router, "GET", "/impersonate/does-not-exist", None, None)
            .await;
    assert_eq!(status, 303);
    assert_eq!(header_str(&headers, "location"), INVALID_LINK);
}

#[tokio::test]
async fn non_admin_cannot_issue() {
    let (router, stores) = create_test_router_and_stores().await;
    let owner = create_user(&stores, "owner").await;
    let other = create_user(&stores, "other").await;

    let (status, body) = send_request(
        &router,
        "POST",
        "/api/admin/impersonate",
        Some(&owner.access_token),
        Some(json!({ "target_user_id": other.id })),
    )
    .await;
    assert_api_error(status, &body, 400, "AuthorizationError");
}

#[tokio::test]
async fn non_admin_rejected_before_payload_check() {
    let (router, stores) = create_test_router_and_stores().await;
    let owner = create_user(&stores, "owner").await;

    let (status, body) = send_request(
        &router,
        "POST",
        "/api/admin/impersonate",
        Some(&owner.access_token),
        Some(json!({ "unexpected": true })),
    )
    .await;
    assert_api_error(status, &body, 400, "AuthorizationError");
}

#[tokio::test]
async fn issue_requires_credential() {
    let (router, _stores) = create_test_router_and_stores().await;
    let (status, body) = send_request(
        &router,
        "POST",
        "/api/admin/impersonate",
        None,
        Some(json!({ "target_user_id": "anyone" })),
    )
    .await;
    assert_api_error(status, &body, 400, "AuthenticationRequired");
}

#[tokio::test]
async fn unknown_target_is_rejected() {
    let (router, stores) = create_test_router_and_stores().await;
    let admin = create_admin(&stores, "admin").await;

    let (status, body) = send_request(
        &router,
        "POST",
        "/api/admin/impersonate",
        Some(&admin.access_token),
        Some(json!({ "target_user_id": "no-such-user" })),
    )
    .await;
    assert_api_error(status, &body, 400, "UserNotFound");
}

#[tokio::test]
async fn missing_target_field_is_invalid_request() {
    let (router, stores) = create_test_router_and_stores().await;
    let admin = create_admin(&stores, "admin").await;

    let (status, body) = send_request(
        &router,
        "POST",
        "/api/admin/impersonate",
        Some(&admin.access_token),
        Some(json!({})),
    )
    .await;
    assert_api_error(status, &body, 400, "InvalidRequest");
}
