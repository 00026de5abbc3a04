use botdesk_core::{AccountStore, IdentityProvider};
use botdesk_test_utils::*;
use serde_json::json;

async fn moderate(
    router: &axum::Router,
    admin: &TestUser,
    payload: serde_json::Value,
) -> (u16, serde_json::Value) {
    send_request(
        router,
        "POST",
        "/api/admin/moderation",
        Some(&admin.access_token),
        Some(payload),
    )
    .await
}

#[tokio::test]
async fn ban_records_active_action() {
    let (router, stores) = create_test_router_and_stores().await;
    let admin = create_admin(&stores, "admin").await;
    let target = create_user(&stores, "spammer").await;

    let (status, body) = moderate(
        &router,
        &admin,
        json!({ "action": "ban", "target_user_id": target.id, "reason": "spam" }),
    )
    .await;
    assert_api_ok(status, &body);
    assert_eq!(body["message"], "User banned successfully");

    let actions = stores
        .account_store
        .list_moderation_actions(&target.id)
        .await
        .unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].action_type, "ban");
    assert_eq!(actions[0].admin_id, admin.id);
    assert_eq!(actions[0].reason.as_deref(), Some("spam"));
    assert!(actions[0].is_active);
}

#[tokio::test]
async fn repeated_bans_create_separate_rows_and_unban_clears_all() {
    let (router, stores) = create_test_router_and_stores().await;
    let admin = create_admin(&stores, "admin").await;
    let target = create_user(&stores, "spammer").await;

    for _ in 0..2 {
        let (status, _) = moderate(
            &router,
            &admin,
            json!({ "action": "ban", "target_user_id": target.id }),
        )
        .await;
        assert_eq!(status, 200);
    }

    let (status, body) = moderate(
        &router,
        &admin,
        json!({ "action": "unban", "target_user_id": target.id }),
    )
    .await;
    assert_api_ok(status, &body);
    assert_eq!(body["message"], "User unbanned successfully");
    assert_eq!(body["updated"], 2);

    let actions = stores
        .account_store
        .list_moderation_actions(&target.id)
        .await
        .unwrap();
    assert_eq!(actions.len(), 2);
    assert!(actions.iter().all(|a| !a.is_active));
}

#[tokio::test]
async fn unban_without_ban_is_noop() {
    let (router, stores) = create_test_router_and_stores().await;
    let admin = create_admin(&stores, "admin").await;
    let target = create_user(&stores, "clean").await;

    let (status, body) = moderate(
        &router,
        &admin,
        json!({ "action": "unban", "target_user_id": target.id }),
    )
    .await;
    assert_api_ok(status, &body);
    assert_eq!(body["updated"], 0);
}

#[tokio::test]
async fn unknown_action_is_invalid() {
    let (router, stores) = create_test_router_and_stores().await;
    let admin = create_admin(&stores, "admin").await;

    let (status, body) = moderate(
        &router,
        &admin,
        json!({ "action": "mute", "target_user_id": "someone" }),
    )
    .await;
    assert_api_error(status, &body, 400, "InvalidRequest");
    assert_eq!(body["error"], "invalid request: Invalid action");
}

#[tokio::test]
async fn non_admin_cannot_moderate() {
    let (router, stores) = create_test_router_and_stores().await;
    let owner = create_user(&stores, "owner").await;
    let other = create_user(&stores, "other").await;

    let (status, body) = moderate(
        &router,
        &owner,
        json!({ "action": "ban", "target_user_id": other.id }),
    )
    .await;
    assert_api_error(status, &body, 400, "AuthorizationError");

    let actions = stores
        .account_store
        .list_moderation_actions(&other.id)
        .await
        .unwrap();
    assert!(actions.is_empty());
}

#[tokio::test]
async fn history_is_admin_only_and_newest_first() {
    let (router, stores) = create_test_router_and_stores().await;
    let admin = create_admin(&stores, "admin").await;
    let target = create_user(&stores, "spammer").await;

    moderate(
        &router,
        &admin,
        json!({ "action": "ban", "target_user_id": target.id, "reason": "first" }),
    )
    .await;
    moderate(
        &router,
        &admin,
        json!({ "action": "ban", "target_user_id": target.id, "reason": "second" }),
    )
    .await;

    let uri = format!("/api/admin/moderation/{}", target.id);
    let (status, body) = send_request(&router, "GET", &uri, Some(&admin.access_token), None).await;
    assert_api_ok(status, &body);
    assert_eq!(body["banned"], true);
    let actions = body["actions"].as_array().unwrap();
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0]["reason"], "second");

    let (status, body) =
        send_request(&router, "GET", &uri, Some(&target.access_token), None).await;
    assert_api_error(status, &body, 400, "AuthorizationError");
}

#[tokio::test]
async fn banned_user_cannot_sign_in_until_unbanned() {
    let (router, stores) = create_test_router_and_stores().await;
    let admin = create_admin(&stores, "admin").await;
    let target = create_user(&stores, "spammer").await;
    let identity = create_test_identity(&stores);

    moderate(
        &router,
        &admin,
        json!({ "action": "ban", "target_user_id": target.id }),
    )
    .await;

    let code = identity.issue_sign_in_code(&target.email).await.unwrap();
    let (status, body) = send_request(
        &router,
        "POST",
        "/api/auth/verify",
        None,
        Some(json!({ "email": target.email, "code": code })),
    )
    .await;
    assert_api_error(status, &body, 400, "AccountBanned");

    moderate(
        &router,
        &admin,
        json!({ "action": "unban", "target_user_id": target.id }),
    )
    .await;

    let code = identity.issue_sign_in_code(&target.email).await.unwrap();
    let (status, _) = send_request(
        &router,
        "POST",
        "/api/auth/verify",
        None,
        Some(json!({ "email": target.email, "code": code })),
    )
    .await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn expired_ban_does_not_block_sign_in() {
    let (router, stores) = create_test_router_and_stores().await;
    let admin = create_admin(&stores, "admin").await;
    let target = create_user(&stores, "reformed").await;

    let expired = (chrono::Utc::now() - chrono::Duration::hours(1)).to_rfc3339();
    let (status, _) = moderate(
        &router,
        &admin,
        json!({ "action": "ban", "target_user_id": target.id, "expires_at": expired }),
    )
    .await;
    assert_eq!(status, 200);

    let code = create_test_identity(&stores)
        .issue_sign_in_code(&target.email)
        .await
        .unwrap();
    let (status, _) = send_request(
        &router,
        "POST",
        "/api/auth/verify",
        None,
        Some(json!({ "email": target.email, "code": code })),
    )
    .await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn impersonating_banned_user_is_refused() {
    let (router, stores) = create_test_router_and_stores().await;
    let admin = create_admin(&stores, "admin").await;
    let target = create_user(&stores, "spammer").await;

    moderate(
        &router,
        &admin,
        json!({ "action": "ban", "target_user_id": target.id }),
    )
    .await;

    let (_, body) = send_request(
        &router,
        "POST",
        "/api/admin/impersonate",
        Some(&admin.access_token),
        Some(json!({ "target_user_id": target.id })),
    )
    .await;
    let path = body["login_url"]
        .as_str()
        .unwrap()
        .trim_start_matches(TEST_PUBLIC_URL)
        .to_string();

    let (status, headers, _) = send_request_with_headers(&router, "GET", &path, None, None).await;
    assert_eq!(status, 303);
    assert!(header_str(&headers, "location").ends_with("toast=impersonation_invalid"));
}
