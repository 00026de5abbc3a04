use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::{AuthenticatedUser, require_admin};
use crate::error::ApiError;
use crate::state::AppState;
use botdesk_core::traits::*;
use botdesk_core::{BAN_ACTION, BotdeskError, NewModerationAction};

#[derive(Debug, Deserialize)]
pub struct ModerationRequest {
    pub action: String,
    pub target_user_id: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModerationCommand {
    Ban,
    Unban,
}

impl ModerationCommand {
    fn parse(action: &str) -> Result<Self, BotdeskError> {
        match action {
            "ban" => Ok(Self::Ban),
            "unban" => Ok(Self::Unban),
            _ => Err(BotdeskError::InvalidRequest("Invalid action".to_string())),
        }
    }
}

pub async fn record_moderation_action<A, S, O>(
    State(state): State<AppState<A, S, O>>,
    user: AuthenticatedUser,
    body: Result<Json<ModerationRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
    A: AccountStore,
    S: SubscriberStore,
    O: OnboardingStore,
{
    require_admin(state.account_store.as_ref(), &user).await?;
    let Json(body) = body?;

    match ModerationCommand::parse(&body.action)? {
        ModerationCommand::Ban => {
            // No dedup: every ban is its own audit row.
            let action = state
                .account_store
                .create_moderation_action(&NewModerationAction {
                    user_id: body.target_user_id.clone(),
                    action_type: BAN_ACTION.to_string(),
                    reason: body.reason,
                    admin_id: user.user_id.clone(),
                    expires_at: body.expires_at,
                })
                .await?;
            tracing::info!(
                admin_id = %user.user_id,
                target_user_id = %body.target_user_id,
                action_id = action.id,
                "user banned"
            );
            Ok(Json(json!({
                "message": "User banned successfully",
                "action_id": action.id,
            })))
        }
        ModerationCommand::Unban => {
            let updated = state
                .account_store
                .deactivate_bans(&body.target_user_id)
                .await?;
            tracing::info!(
                admin_id = %user.user_id,
                target_user_id = %body.target_user_id,
                updated,
                "user unbanned"
            );
            Ok(Json(json!({
                "message": "User unbanned successfully",
                "updated": updated,
            })))
        }
    }
}

pub async fn list_moderation_actions<A, S, O>(
    State(state): State<AppState<A, S, O>>,
    user: AuthenticatedUser,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError>
where
    A: AccountStore,
    S: SubscriberStore,
    O: OnboardingStore,
{
    require_admin(state.account_store.as_ref(), &user).await?;

    let now = Utc::now();
    let actions = state.account_store.list_moderation_actions(&user_id).await?;
    let banned = actions.iter().any(|a| a.is_in_effect(now));

    Ok(Json(json!({
        "user_id": user_id,
        "banned": banned,
        "actions": actions,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_actions_only() {
        assert_eq!(ModerationCommand::parse("ban").unwrap(), ModerationCommand::Ban);
        assert_eq!(ModerationCommand::parse("unban").unwrap(), ModerationCommand::Unban);
        assert!(matches!(
            ModerationCommand::parse("mute"),
            Err(BotdeskError::InvalidRequest(_))
        ));
        assert!(ModerationCommand::parse("BAN").is_err());
    }
}
