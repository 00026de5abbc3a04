use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;
use botdesk_core::traits::*;
use botdesk_core::{BotdeskError, StepData};

const MAX_STEP_ID_LEN: usize = 64;

#[derive(Debug, Deserialize)]
pub struct RecordStepRequest {
    #[serde(default)]
    pub step_data: StepData,
}

fn validate_step_id(step_id: &str) -> Result<(), BotdeskError> {
    if step_id.is_empty() || step_id.len() > MAX_STEP_ID_LEN {
        return Err(BotdeskError::InvalidRequest(format!(
            "step id must be 1 to {MAX_STEP_ID_LEN} characters"
        )));
    }
    if !step_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(BotdeskError::InvalidRequest(
            "step id may only contain letters, digits, '-' and '_'".to_string(),
        ));
    }
    Ok(())
}

pub async fn record_step<A, S, O>(
    State(state): State<AppState<A, S, O>>,
    user: AuthenticatedUser,
    Path(step_id): Path<String>,
    body: Result<Json<RecordStepRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
    A: AccountStore,
    S: SubscriberStore,
    O: OnboardingStore,
{
    validate_step_id(&step_id)?;
    let Json(body) = body?;

    let entry = state
        .onboarding_store
        .upsert_progress(&user.user_id, &step_id, &body.step_data, Utc::now())
        .await?;

    tracing::debug!(user_id = %user.user_id, step_id = %step_id, "onboarding step recorded");
    Ok(Json(json!(entry)))
}

pub async fn get_progress<A, S, O>(
    State(state): State<AppState<A, S, O>>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, ApiError>
where
    A: AccountStore,
    S: SubscriberStore,
    O: OnboardingStore,
{
    let steps = state.onboarding_store.list_progress(&user.user_id).await?;
    let last_completed_step = state
        .onboarding_store
        .last_completed_step(&user.user_id)
        .await?;

    Ok(Json(json!({
        "steps": steps,
        "last_completed_step": last_completed_step,
    })))
}
