use botdesk_test_utils::*;

#[tokio::test]
async fn health_reports_version() {
    let (router, _stores) = create_test_router_and_stores().await;
    let (status, body) = send_request(&router, "GET", "/api/health", None, None).await;
    let body = assert_api_ok(status, &body);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    use axum::body::Body;
    use tower::ServiceExt;

    let (router, _stores) = create_test_router_and_stores().await;
    let req = axum::http::Request::builder()
        .method("OPTIONS")
        .uri("/api/billing/trial")
        .header("origin", "https://widget.example")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "authorization,apikey")
        .body(Body::empty())
        .unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn unknown_route_404() {
    let (router, _stores) = create_test_router_and_stores().await;
    let (status, _) = send_request(&router, "GET", "/api/nope", None, None).await;
    assert_eq!(status, 404);
}
