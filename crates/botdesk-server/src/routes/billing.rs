use axum::Json;
use axum::extract::State;
use chrono::{Duration, Utc};
use serde_json::{Value, json};

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;
use botdesk_core::traits::*;
use botdesk_core::{BotdeskError, TrialGrant};

pub const TRIAL_DAYS: i64 = 14;

const TRIAL_CONFLICT: &str = "User already has a trial or subscription";

fn caller_email(user: &AuthenticatedUser) -> Result<&str, BotdeskError> {
    user.email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| BotdeskError::Auth("User not authenticated".to_string()))
}

pub async fn start_trial<A, S, O>(
    State(state): State<AppState<A, S, O>>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, ApiError>
where
    A: AccountStore,
    S: SubscriberStore,
    O: OnboardingStore,
{
    let email = caller_email(&user)?;

    if let Some(existing) = state.subscriber_store.get_subscriber(email).await? {
        if existing.has_trial_or_subscription() {
            return Err(BotdeskError::Conflict(TRIAL_CONFLICT.to_string()).into());
        }
    }

    let grant = TrialGrant {
        email: email.to_string(),
        user_id: user.user_id.clone(),
        trial_end: Utc::now() + Duration::days(TRIAL_DAYS),
    };

    // The store re-checks the row atomically; a concurrent grant that slipped
    // past the read above ends up here.
    if !state.subscriber_store.start_trial(&grant).await? {
        return Err(BotdeskError::Conflict(TRIAL_CONFLICT.to_string()).into());
    }

    tracing::info!(user_id = %user.user_id, trial_end = %grant.trial_end, "trial started");

    Ok(Json(json!({
        "success": true,
        "trial_end": grant.trial_end,
    })))
}

pub async fn billing_status<A, S, O>(
    State(state): State<AppState<A, S, O>>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, ApiError>
where
    A: AccountStore,
    S: SubscriberStore,
    O: OnboardingStore,
{
    let email = caller_email(&user)?;
    let now = Utc::now();

    let body = match state.subscriber_store.get_subscriber(email).await? {
        Some(sub) => json!({
            "email": sub.email,
            "subscribed": sub.subscribed,
            "is_trial": sub.is_trial,
            "trial_end": sub.trial_end,
            "trial_active": sub.trial_active(now),
            "subscription_tier": sub.subscription_tier,
            "subscription_end": sub.subscription_end,
        }),
        None => json!({
            "email": email,
            "subscribed": false,
            "is_trial": false,
            "trial_end": null,
            "trial_active": false,
            "subscription_tier": null,
            "subscription_end": null,
        }),
    };

    Ok(Json(body))
}
