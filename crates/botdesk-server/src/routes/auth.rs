use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::identity::normalize_email;
use crate::state::AppState;
use botdesk_core::Role;
use botdesk_core::traits::*;

#[derive(Debug, Deserialize)]
pub struct SignInCodeRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: String,
}

pub async fn request_sign_in_code<A, S, O>(
    State(state): State<AppState<A, S, O>>,
    body: Result<Json<SignInCodeRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
    A: AccountStore,
    S: SubscriberStore,
    O: OnboardingStore,
{
    let Json(body) = body?;
    let email = normalize_email(&body.email)?;
    let code = state.identity.issue_sign_in_code(&email).await?;

    match &state.email_sender {
        Some(sender) => {
            sender
                .send_sign_in_code(&email, &code, &state.config.public_url)
                .await?;
        }
        None => {
            tracing::warn!("SMTP not configured, sign-in code was not delivered");
        }
    }

    Ok(Json(json!({ "sent": true })))
}

pub async fn verify_sign_in_code<A, S, O>(
    State(state): State<AppState<A, S, O>>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
    A: AccountStore,
    S: SubscriberStore,
    O: OnboardingStore,
{
    let Json(body) = body?;
    let session = state
        .identity
        .complete_sign_in(&body.email, &body.code)
        .await?;

    tracing::info!(user_id = %session.user_id, "signed in");

    Ok(Json(json!({
        "access_token": session.access_token,
        "token_type": "bearer",
        "expires_at": session.expires_at,
        "user_id": session.user_id,
        "email": session.email,
    })))
}

pub async fn get_session<A, S, O>(
    State(state): State<AppState<A, S, O>>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, ApiError>
where
    A: AccountStore,
    S: SubscriberStore,
    O: OnboardingStore,
{
    let is_admin = state
        .account_store
        .has_role(&user.user_id, Role::Admin)
        .await?;

    Ok(Json(json!({
        "user_id": user.user_id,
        "email": user.email,
        "is_admin": is_admin,
    })))
}
