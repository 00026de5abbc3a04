use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::BotdeskResult;
use crate::types::{
    ImpersonationToken, ModerationAction, NewModerationAction, NewUser, Role, SignInCodeRecord,
    User,
};

#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    async fn create_user(&self, input: &NewUser) -> BotdeskResult<User>;
    async fn get_user_by_id(&self, id: &str) -> BotdeskResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> BotdeskResult<Option<User>>;

    // Roles
    async fn grant_role(&self, user_id: &str, role: Role) -> BotdeskResult<()>;
    async fn has_role(&self, user_id: &str, role: Role) -> BotdeskResult<bool>;

    // Impersonation tokens
    async fn create_impersonation_token(&self, token: &ImpersonationToken) -> BotdeskResult<()>;
    async fn get_impersonation_token(&self, token: &str)
        -> BotdeskResult<Option<ImpersonationToken>>;
    /// Mark the token used only if it is currently unused and unexpired at
    /// `now`. Returns the updated row, or `None` if nothing was redeemed.
    async fn redeem_impersonation_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> BotdeskResult<Option<ImpersonationToken>>;

    // Moderation
    async fn create_moderation_action(
        &self,
        input: &NewModerationAction,
    ) -> BotdeskResult<ModerationAction>;
    /// Flip every active ban row for the user to inactive. Returns the number
    /// of rows updated.
    async fn deactivate_bans(&self, user_id: &str) -> BotdeskResult<u64>;
    async fn list_moderation_actions(&self, user_id: &str) -> BotdeskResult<Vec<ModerationAction>>;

    // One-time sign-in codes
    async fn create_sign_in_code(&self, record: &SignInCodeRecord) -> BotdeskResult<()>;
    /// Consume a code atomically. Returns `true` if an unused, unexpired code
    /// with this hash existed for the user.
    async fn consume_sign_in_code(
        &self,
        code_hash: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> BotdeskResult<bool>;
}
