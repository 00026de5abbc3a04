use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;
use botdesk_core::BotdeskError;
use botdesk_core::traits::*;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub widget_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub widget_id: String,
}

/// Widget traffic; unauthenticated.
pub async fn send_message<A, S, O>(
    State(state): State<AppState<A, S, O>>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError>
where
    A: AccountStore,
    S: SubscriberStore,
    O: OnboardingStore,
{
    let Json(body) = body?;
    if body.message.trim().is_empty() {
        return Err(BotdeskError::InvalidRequest("message must not be empty".to_string()).into());
    }

    let response = state.chat_relay.relay(&body.message, &body.widget_id).await?;

    Ok(Json(ChatResponse {
        response,
        widget_id: body.widget_id,
    }))
}
