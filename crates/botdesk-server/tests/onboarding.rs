use botdesk_test_utils::*;
use serde_json::json;

#[tokio::test]
async fn records_and_lists_steps() {
    let (router, stores) = create_test_router_and_stores().await;
    let owner = create_user(&stores, "owner").await;

    let (status, body) = send_request(
        &router,
        "PUT",
        "/api/onboarding/steps/business-profile",
        Some(&owner.access_token),
        Some(json!({
            "step_data": { "kind": "business_profile", "company_name": "Acme" }
        })),
    )
    .await;
    assert_api_ok(status, &body);
    assert_eq!(body["step_id"], "business-profile");
    assert_eq!(body["step_data"]["company_name"], "Acme");

    send_request(
        &router,
        "PUT",
        "/api/onboarding/steps/widget",
        Some(&owner.access_token),
        Some(json!({
            "step_data": { "kind": "widget", "widget_id": "w-1", "primary_color": "#ff0000" }
        })),
    )
    .await;

    let (status, body) = send_request(
        &router,
        "GET",
        "/api/onboarding",
        Some(&owner.access_token),
        None,
    )
    .await;
    assert_api_ok(status, &body);
    let steps = body["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0]["step_id"], "business-profile");
    assert_eq!(body["last_completed_step"], "widget");
}

#[tokio::test]
async fn re_recording_a_step_replaces_it() {
    let (router, stores) = create_test_router_and_stores().await;
    let owner = create_user(&stores, "owner").await;

    for name in ["Acme", "Acme Ltd"] {
        let (status, _) = send_request(
            &router,
            "PUT",
            "/api/onboarding/steps/business-profile",
            Some(&owner.access_token),
            Some(json!({
                "step_data": { "kind": "business_profile", "company_name": name }
            })),
        )
        .await;
        assert_eq!(status, 200);
    }

    let (_, body) = send_request(
        &router,
        "GET",
        "/api/onboarding",
        Some(&owner.access_token),
        None,
    )
    .await;
    let steps = body["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0]["step_data"]["company_name"], "Acme Ltd");
}

#[tokio::test]
async fn known_step_keeps_fields_it_does_not_name() {
    let (router, stores) = create_test_router_and_stores().await;
    let owner = create_user(&stores, "owner").await;
    let step_data = json!({
        "kind": "bot_persona",
        "bot_name": "Sunny",
        "tone": "friendly",
        "greeting": "Hi! How can I help?",
        "languages": ["en", "fr"],
    });

    let (status, body) = send_request(
        &router,
        "PUT",
        "/api/onboarding/steps/persona",
        Some(&owner.access_token),
        Some(json!({ "step_data": step_data })),
    )
    .await;
    assert_api_ok(status, &body);
    assert_eq!(body["step_data"], step_data);

    let (_, body) = send_request(
        &router,
        "GET",
        "/api/onboarding",
        Some(&owner.access_token),
        None,
    )
    .await;
    assert_eq!(body["steps"][0]["step_data"], step_data);
}

#[tokio::test]
async fn opaque_and_missing_step_data_are_kept() {
    let (router, stores) = create_test_router_and_stores().await;
    let owner = create_user(&stores, "owner").await;

    let (status, body) = send_request(
        &router,
        "PUT",
        "/api/onboarding/steps/custom",
        Some(&owner.access_token),
        Some(json!({ "step_data": { "anything": [1, 2, 3] } })),
    )
    .await;
    assert_api_ok(status, &body);
    assert_eq!(body["step_data"], json!({ "anything": [1, 2, 3] }));

    let (status, body) = send_request(
        &router,
        "PUT",
        "/api/onboarding/steps/welcome",
        Some(&owner.access_token),
        Some(json!({})),
    )
    .await;
    assert_api_ok(status, &body);
    assert!(body["step_data"].is_null());
}

#[tokio::test]
async fn progress_is_per_user() {
    let (router, stores) = create_test_router_and_stores().await;
    let first = create_user(&stores, "first").await;
    let second = create_user(&stores, "second").await;

    send_request(
        &router,
        "PUT",
        "/api/onboarding/steps/welcome",
        Some(&first.access_token),
        Some(json!({})),
    )
    .await;

    let (status, body) = send_request(
        &router,
        "GET",
        "/api/onboarding",
        Some(&second.access_token),
        None,
    )
    .await;
    assert_api_ok(status, &body);
    assert!(body["steps"].as_array().unwrap().is_empty());
    assert!(body["last_completed_step"].is_null());
}

#[tokio::test]
async fn invalid_step_id_rejected() {
    let (router, stores) = create_test_router_and_stores().await;
    let owner = create_user(&stores, "owner").await;
    let long = format!("/api/onboarding/steps/{}", "x".repeat(65));

    let (status, body) =
        send_request(&router, "PUT", &long, Some(&owner.access_token), Some(json!({}))).await;
    assert_api_error(status, &body, 400, "InvalidRequest");
}

#[tokio::test]
async fn onboarding_requires_credential() {
    let (router, _stores) = create_test_router_and_stores().await;
    let (status, body) = send_request(&router, "GET", "/api/onboarding", None, None).await;
    assert_api_error(status, &body, 400, "AuthenticationRequired");
}
