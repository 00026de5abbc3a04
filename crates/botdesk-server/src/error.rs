use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use botdesk_core::BotdeskError;
use serde_json::json;

/// Error returned at the HTTP boundary. Rendered as
/// `{"error": "<message>", "code": "<Code>"}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    fn bad_request(code: &str, err: &BotdeskError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, err.to_string())
    }

    fn internal(code: &str, err: &BotdeskError) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, code = %self.code, "{}", self.message);
        } else {
            tracing::warn!(status = %self.status, code = %self.code, "{}", self.message);
        }

        let body = json!({
            "error": self.message,
            "code": self.code,
        });
        (self.status, axum::Json(body)).into_response()
    }
}

impl From<BotdeskError> for ApiError {
    fn from(err: BotdeskError) -> Self {
        match &err {
            BotdeskError::Auth(_) => ApiError::bad_request("AuthenticationRequired", &err),
            BotdeskError::Forbidden(_) => ApiError::bad_request("AuthorizationError", &err),
            BotdeskError::NotFound(_) => ApiError::bad_request("NotFound", &err),
            BotdeskError::InvalidToken => ApiError::bad_request("InvalidToken", &err),
            BotdeskError::Conflict(_) => ApiError::bad_request("Conflict", &err),
            BotdeskError::InvalidRequest(_) => ApiError::bad_request("InvalidRequest", &err),
            BotdeskError::UserNotFound => ApiError::bad_request("UserNotFound", &err),
            BotdeskError::AccountBanned => ApiError::bad_request("AccountBanned", &err),
            BotdeskError::Upstream(_) => ApiError::internal("UpstreamFailure", &err),
            BotdeskError::Storage(_) | BotdeskError::Crypto(_) | BotdeskError::InternalError(_) => {
                ApiError::internal("InternalServerError", &err)
            }
        }
    }
}

impl From<axum::extract::rejection::JsonRejection> for ApiError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, "InvalidRequest", rejection.body_text())
    }
}
