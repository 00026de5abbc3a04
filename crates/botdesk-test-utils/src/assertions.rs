use serde_json::Value;

/// Assert the response status is 200 and return the JSON body.
pub fn assert_api_ok(status: u16, body: &Value) -> &Value {
    assert_eq!(status, 200, "Expected 200 OK, got {status}: {body}");
    body
}

/// Assert the response matches the expected status and error code.
pub fn assert_api_error(status: u16, body: &Value, expected_status: u16, expected_code: &str) {
    assert_eq!(
        status, expected_status,
        "Expected status {expected_status}, got {status}: {body}"
    );
    let code = body.get("code").and_then(|c| c.as_str());
    assert_eq!(
        code,
        Some(expected_code),
        "Expected code '{expected_code}', got {code:?}: {body}"
    );
}
