use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use botdesk_core::{
    AccountStore, BotdeskError, BotdeskResult, Identity, IdentityProvider, NewUser, Session,
    SignInCodeRecord, User,
};
use botdesk_crypto::{
    ACCESS_TOKEN_TTL_SECS, create_access_token, generate_sign_in_code, hash_sign_in_code,
    validate_access_token,
};

/// One-time sign-in codes expire after 15 minutes.
pub const SIGN_IN_CODE_TTL_MINUTES: i64 = 15;

/// Identity provider backed by the account store and HS256 access tokens.
pub struct JwtIdentityProvider<A: AccountStore> {
    account_store: Arc<A>,
    access_secret: String,
}

impl<A: AccountStore> JwtIdentityProvider<A> {
    pub fn new(account_store: Arc<A>, access_secret: impl Into<String>) -> Self {
        Self {
            account_store,
            access_secret: access_secret.into(),
        }
    }
}

pub(crate) fn normalize_email(email: &str) -> BotdeskResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(BotdeskError::InvalidRequest(format!("invalid email address: {email}"))),
    }
}

/// Look a user up by email, creating one if none exists yet.
pub async fn find_or_create_user<A: AccountStore>(
    account_store: &A,
    email: &str,
) -> BotdeskResult<User> {
    let email = normalize_email(email)?;
    if let Some(user) = account_store.get_user_by_email(&email).await? {
        return Ok(user);
    }

    let input = NewUser {
        id: uuid::Uuid::new_v4().to_string(),
        email: email.clone(),
    };
    match account_store.create_user(&input).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "created user");
            Ok(user)
        }
        // Lost a race with a concurrent sign-up for the same email.
        Err(BotdeskError::Conflict(_)) => account_store
            .get_user_by_email(&email)
            .await?
            .ok_or(BotdeskError::UserNotFound),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl<A: AccountStore> IdentityProvider for JwtIdentityProvider<A> {
    async fn resolve_bearer(&self, token: &str) -> BotdeskResult<Identity> {
        let claims = validate_access_token(token, &self.access_secret)?;
        Ok(Identity {
            user_id: claims.sub,
            email: claims.email,
        })
    }

    async fn issue_sign_in_code(&self, email: &str) -> BotdeskResult<String> {
        let user = find_or_create_user(self.account_store.as_ref(), email).await?;

        let code = generate_sign_in_code();
        let record = SignInCodeRecord {
            code_hash: hash_sign_in_code(&code),
            user_id: user.id.clone(),
            expires_at: Utc::now() + Duration::minutes(SIGN_IN_CODE_TTL_MINUTES),
        };
        self.account_store.create_sign_in_code(&record).await?;

        tracing::debug!(user_id = %user.id, "issued sign-in code");
        Ok(code)
    }

    async fn complete_sign_in(&self, email: &str, code: &str) -> BotdeskResult<Session> {
        let email = normalize_email(email)?;
        let user = self
            .account_store
            .get_user_by_email(&email)
            .await?
            .ok_or(BotdeskError::InvalidToken)?;

        let now = Utc::now();
        let consumed = self
            .account_store
            .consume_sign_in_code(&hash_sign_in_code(code), &user.id, now)
            .await?;
        if !consumed {
            return Err(BotdeskError::InvalidToken);
        }

        let banned = self
            .account_store
            .list_moderation_actions(&user.id)
            .await?
            .iter()
            .any(|action| action.is_in_effect(now));
        if banned {
            tracing::warn!(user_id = %user.id, "sign-in refused for banned user");
            return Err(BotdeskError::AccountBanned);
        }

        let access_token = create_access_token(&user.id, &user.email, &self.access_secret)?;
        Ok(Session {
            access_token,
            user_id: user.id,
            email: user.email,
            expires_at: now + Duration::seconds(ACCESS_TOKEN_TTL_SECS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  Owner@Shop.Test ").unwrap(), "owner@shop.test");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["", "no-at-sign", "@shop.test", "owner@localhost"] {
            assert!(normalize_email(bad).is_err(), "{bad} should be rejected");
        }
    }
}
