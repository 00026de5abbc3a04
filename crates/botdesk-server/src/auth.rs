use std::sync::Arc;

use axum::Extension;
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, StatusCode, header};
use axum::http::request::Parts;
use botdesk_core::{AccountStore, BotdeskError, IdentityProvider, Role};

use crate::error::ApiError;

/// The identity provider, added as an Axum Extension so extractors can reach
/// it without knowing the concrete state type.
#[derive(Clone)]
pub struct IdentityHandle(pub Arc<dyn IdentityProvider>);

/// The caller behind a valid bearer credential.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: Option<String>,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(identity) = Extension::<IdentityHandle>::from_request_parts(parts, state)
            .await
            .map_err(|_| {
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalServerError",
                    "Identity provider not configured",
                )
            })?;

        let token = bearer_token(&parts.headers)?;

        let resolved = identity.0.resolve_bearer(token).await.map_err(|e| match e {
            BotdeskError::Auth(msg) if msg.contains("ExpiredSignature") => {
                ApiError::new(StatusCode::BAD_REQUEST, "ExpiredToken", "Token has expired")
            }
            BotdeskError::Auth(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "InvalidToken", "Invalid token")
            }
            other => other.into(),
        })?;

        Ok(AuthenticatedUser {
            user_id: resolved.user_id,
            email: resolved.email,
        })
    }
}

fn authentication_required(message: &str) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "AuthenticationRequired", message)
}

/// The credential from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| authentication_required("Missing authorization header"))?;

    match value.strip_prefix("Bearer ").map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(authentication_required("Invalid authorization format")),
    }
}

/// Reject callers that do not hold an admin role record.
pub async fn require_admin<A: AccountStore>(
    account_store: &A,
    user: &AuthenticatedUser,
) -> Result<(), ApiError> {
    if account_store.has_role(&user.user_id, Role::Admin).await? {
        Ok(())
    } else {
        Err(BotdeskError::Forbidden("admin role required".to_string()).into())
    }
}
