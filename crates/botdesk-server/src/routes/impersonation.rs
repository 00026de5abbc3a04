use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::{AuthenticatedUser, require_admin};
use crate::error::ApiError;
use crate::state::AppState;
use botdesk_core::traits::*;
use botdesk_core::{BotdeskError, BotdeskResult, ImpersonationToken, Session};
use botdesk_crypto::ACCESS_TOKEN_TTL_SECS;

/// Impersonation links are valid for 10 minutes.
pub const IMPERSONATION_TOKEN_TTL_MINUTES: i64 = 10;

/// Cookie carrying the access token after a browser sign-in.
pub const SESSION_COOKIE: &str = "botdesk_session";

/// Query value the home page turns into an "invalid or expired link" toast.
pub const INVALID_LINK_TOAST: &str = "impersonation_invalid";

// ---------------------------------------------------------------------------
// 1. issue
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ImpersonateRequest {
    pub target_user_id: String,
}

pub async fn issue_impersonation_token<A, S, O>(
    State(state): State<AppState<A, S, O>>,
    user: AuthenticatedUser,
    body: Result<Json<ImpersonateRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
    A: AccountStore,
    S: SubscriberStore,
    O: OnboardingStore,
{
    // Authorization comes before payload validation.
    require_admin(state.account_store.as_ref(), &user).await?;
    let Json(body) = body?;

    let target = state
        .account_store
        .get_user_by_id(&body.target_user_id)
        .await?
        .ok_or(BotdeskError::UserNotFound)?;

    let now = Utc::now();
    let record = ImpersonationToken {
        token: botdesk_crypto::generate_impersonation_token(),
        target_user_id: target.id.clone(),
        admin_id: user.user_id.clone(),
        expires_at: now + Duration::minutes(IMPERSONATION_TOKEN_TTL_MINUTES),
        used_at: None,
        created_at: now,
    };
    state.account_store.create_impersonation_token(&record).await?;

    tracing::info!(
        admin_id = %user.user_id,
        target_user_id = %target.id,
        expires_at = %record.expires_at,
        "impersonation link issued"
    );

    let login_url = format!(
        "{}/impersonate/{}",
        state.config.public_url.trim_end_matches('/'),
        record.token
    );
    Ok(Json(json!({ "login_url": login_url })))
}

// ---------------------------------------------------------------------------
// 2. redeem
// ---------------------------------------------------------------------------

async fn redeem<A, S, O>(state: &AppState<A, S, O>, token: &str) -> BotdeskResult<Session>
where
    A: AccountStore,
    S: SubscriberStore,
    O: OnboardingStore,
{
    let now = Utc::now();
    let Some(record) = state
        .account_store
        .redeem_impersonation_token(token, now)
        .await?
    else {
        let reason = rejection_reason(state, token, now).await?;
        tracing::warn!(reason, "impersonation link not redeemable");
        return Err(BotdeskError::InvalidToken);
    };

    let target = state
        .account_store
        .get_user_by_id(&record.target_user_id)
        .await?
        .ok_or(BotdeskError::UserNotFound)?;

    let code = state.identity.issue_sign_in_code(&target.email).await?;
    let session = state.identity.complete_sign_in(&target.email, &code).await?;

    tracing::info!(
        admin_id = %record.admin_id,
        target_user_id = %target.id,
        "impersonation link redeemed"
    );
    Ok(session)
}

async fn rejection_reason<A, S, O>(
    state: &AppState<A, S, O>,
    token: &str,
    now: DateTime<Utc>,
) -> BotdeskResult<&'static str>
where
    A: AccountStore,
    S: SubscriberStore,
    O: OnboardingStore,
{
    let reason = match state.account_store.get_impersonation_token(token).await? {
        None => "unknown token",
        // Redeemable on re-read: another request claimed it first.
        Some(record) => record.rejection_reason(now).unwrap_or("redeemed concurrently"),
    };
    Ok(reason)
}

/// Browser entry point for an impersonation link. Always answers with a
/// redirect: to the dashboard with a session cookie on success, or to the
/// home page with a toast marker on any failure.
pub async fn redeem_impersonation_token<A, S, O>(
    State(state): State<AppState<A, S, O>>,
    Path(token): Path<String>,
) -> Response
where
    A: AccountStore,
    S: SubscriberStore,
    O: OnboardingStore,
{
    let base = state.config.public_url.trim_end_matches('/');

    match redeem(&state, &token).await {
        Ok(session) => {
            let secure = if base.starts_with("https://") { "; Secure" } else { "" };
            let cookie = format!(
                "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ACCESS_TOKEN_TTL_SECS}{secure}",
                session.access_token
            );
            (
                [(header::SET_COOKIE, cookie)],
                Redirect::to(&format!("{base}/dashboard")),
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "impersonation link rejected");
            Redirect::to(&format!("{base}/?toast={INVALID_LINK_TOAST}")).into_response()
        }
    }
}
