use botdesk_core::{AccountStore, BotdeskResult, Role};

use crate::identity::find_or_create_user;

/// Make sure every configured admin email has a user and an admin role.
pub async fn bootstrap_admins<A: AccountStore>(
    account_store: &A,
    emails: &[String],
) -> BotdeskResult<()> {
    for email in emails {
        let user = find_or_create_user(account_store, email).await?;
        account_store.grant_role(&user.id, Role::Admin).await?;
        tracing::info!(user_id = %user.id, email = %user.email, "admin role ensured");
    }
    Ok(())
}
