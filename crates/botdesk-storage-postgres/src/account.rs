use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use botdesk_core::{
    AccountStore, BotdeskError, BotdeskResult, ImpersonationToken, ModerationAction,
    NewModerationAction, NewUser, Role, SignInCodeRecord, User, BAN_ACTION,
};

#[derive(Clone)]
pub struct PostgresAccountStore {
    pool: PgPool,
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> Result<User, BotdeskError> {
    Ok(User {
        id: row
            .try_get("id")
            .map_err(|e| BotdeskError::Storage(e.to_string()))?,
        email: row
            .try_get("email")
            .map_err(|e| BotdeskError::Storage(e.to_string()))?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| BotdeskError::Storage(e.to_string()))?,
    })
}

fn row_to_impersonation_token(
    row: &sqlx::postgres::PgRow,
) -> Result<ImpersonationToken, BotdeskError> {
    let token: String = row
        .try_get("token")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let target_user_id: String = row
        .try_get("target_user_id")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let admin_id: String = row
        .try_get("admin_id")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let expires_at: DateTime<Utc> = row
        .try_get("expires_at")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let used_at: Option<DateTime<Utc>> = row
        .try_get("used_at")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let created_at: DateTime<Utc> = row
        .try_get("created_at")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;

    Ok(ImpersonationToken {
        token,
        target_user_id,
        admin_id,
        expires_at,
        used_at,
        created_at,
    })
}

fn row_to_moderation_action(row: &sqlx::postgres::PgRow) -> Result<ModerationAction, BotdeskError> {
    let id: i64 = row
        .try_get("id")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let user_id: String = row
        .try_get("user_id")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let action_type: String = row
        .try_get("action_type")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let reason: Option<String> = row
        .try_get("reason")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let admin_id: String = row
        .try_get("admin_id")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let expires_at: Option<DateTime<Utc>> = row
        .try_get("expires_at")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let is_active: bool = row
        .try_get("is_active")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let created_at: DateTime<Utc> = row
        .try_get("created_at")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;

    Ok(ModerationAction {
        id,
        user_id,
        action_type,
        reason,
        admin_id,
        expires_at,
        is_active,
        created_at,
    })
}

const TOKEN_COLUMNS: &str = "token, target_user_id, admin_id, expires_at, used_at, created_at";

const MODERATION_COLUMNS: &str =
    "id, user_id, action_type, reason, admin_id, expires_at, is_active, created_at";

impl PostgresAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn get_user_where(&self, where_clause: &str, bind_value: &str) -> BotdeskResult<Option<User>> {
        let sql = format!("SELECT id, email, created_at FROM app_user WHERE {where_clause}");
        let row = sqlx::query(&sql)
            .bind(bind_value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BotdeskError::Storage(e.to_string()))?;

        match row {
            Some(ref r) => Ok(Some(row_to_user(r)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    async fn create_user(&self, input: &NewUser) -> BotdeskResult<User> {
        let row = sqlx::query(
            "INSERT INTO app_user (id, email) VALUES ($1, $2) RETURNING id, email, created_at",
        )
        .bind(&input.id)
        .bind(&input.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                BotdeskError::Conflict(format!("email already registered: {}", input.email))
            }
            other => BotdeskError::Storage(other.to_string()),
        })?;

        row_to_user(&row)
    }

    async fn get_user_by_id(&self, id: &str) -> BotdeskResult<Option<User>> {
        self.get_user_where("id = $1", id).await
    }

    async fn get_user_by_email(&self, email: &str) -> BotdeskResult<Option<User>> {
        self.get_user_where("email = $1", email).await
    }

    async fn grant_role(&self, user_id: &str, role: Role) -> BotdeskResult<()> {
        sqlx::query(
            "INSERT INTO user_role (user_id, role) VALUES ($1, $2)
             ON CONFLICT (user_id, role) DO NOTHING",
        )
        .bind(user_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn has_role(&self, user_id: &str, role: Role) -> BotdeskResult<bool> {
        let row = sqlx::query("SELECT 1 FROM user_role WHERE user_id = $1 AND role = $2")
            .bind(user_id)
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BotdeskError::Storage(e.to_string()))?;
        Ok(row.is_some())
    }

    async fn create_impersonation_token(&self, token: &ImpersonationToken) -> BotdeskResult<()> {
        sqlx::query(
            "INSERT INTO impersonation_token (token, target_user_id, admin_id, expires_at, used_at, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&token.token)
        .bind(&token.target_user_id)
        .bind(&token.admin_id)
        .bind(token.expires_at)
        .bind(token.used_at)
        .bind(token.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn get_impersonation_token(
        &self,
        token: &str,
    ) -> BotdeskResult<Option<ImpersonationToken>> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM impersonation_token WHERE token = $1");
        let row = sqlx::query(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BotdeskError::Storage(e.to_string()))?;

        match row {
            Some(ref r) => Ok(Some(row_to_impersonation_token(r)?)),
            None => Ok(None),
        }
    }

    async fn redeem_impersonation_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> BotdeskResult<Option<ImpersonationToken>> {
        let sql = format!(
            "UPDATE impersonation_token SET used_at = $1
             WHERE token = $2 AND used_at IS NULL AND expires_at > $1
             RETURNING {TOKEN_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(now)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| BotdeskError::Storage(e.to_string()))?;

        match row {
            Some(ref r) => Ok(Some(row_to_impersonation_token(r)?)),
            None => Ok(None),
        }
    }

    async fn create_moderation_action(
        &self,
        input: &NewModerationAction,
    ) -> BotdeskResult<ModerationAction> {
        let sql = format!(
            "INSERT INTO moderation_action (user_id, action_type, reason, admin_id, expires_at, is_active)
             VALUES ($1, $2, $3, $4, $5, TRUE)
             RETURNING {MODERATION_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&input.user_id)
            .bind(&input.action_type)
            .bind(&input.reason)
            .bind(&input.admin_id)
            .bind(input.expires_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| BotdeskError::Storage(e.to_string()))?;

        row_to_moderation_action(&row)
    }

    async fn deactivate_bans(&self, user_id: &str) -> BotdeskResult<u64> {
        let result = sqlx::query(
            "UPDATE moderation_action SET is_active = FALSE
             WHERE user_id = $1 AND action_type = $2 AND is_active",
        )
        .bind(user_id)
        .bind(BAN_ACTION)
        .execute(&self.pool)
        .await
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn list_moderation_actions(&self, user_id: &str) -> BotdeskResult<Vec<ModerationAction>> {
        let sql = format!(
            "SELECT {MODERATION_COLUMNS} FROM moderation_action
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| BotdeskError::Storage(e.to_string()))?;

        rows.iter().map(row_to_moderation_action).collect()
    }

    async fn create_sign_in_code(&self, record: &SignInCodeRecord) -> BotdeskResult<()> {
        sqlx::query("INSERT INTO sign_in_code (code_hash, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&record.code_hash)
            .bind(&record.user_id)
            .bind(record.expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| BotdeskError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn consume_sign_in_code(
        &self,
        code_hash: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> BotdeskResult<bool> {
        let result = sqlx::query(
            "UPDATE sign_in_code SET used_at = $1
             WHERE code_hash = $2 AND user_id = $3 AND used_at IS NULL AND expires_at > $1",
        )
        .bind(now)
        .bind(code_hash)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }
}
