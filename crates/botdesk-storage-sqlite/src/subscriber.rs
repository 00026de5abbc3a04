use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use botdesk_core::{BotdeskError, BotdeskResult, Subscriber, SubscriberStore, TrialGrant};

use crate::datetime::{format_datetime, parse_datetime, parse_datetime_opt};

#[derive(Clone)]
pub struct SqliteSubscriberStore {
    pool: SqlitePool,
}

fn row_to_subscriber(row: &sqlx::sqlite::SqliteRow) -> Result<Subscriber, BotdeskError> {
    let email: String = row
        .try_get("email")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let user_id: Option<String> = row
        .try_get("user_id")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let subscribed: bool = row
        .try_get("subscribed")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let is_trial: bool = row
        .try_get("is_trial")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let trial_end: Option<String> = row
        .try_get("trial_end")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let subscription_tier: Option<String> = row
        .try_get("subscription_tier")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let subscription_end: Option<String> = row
        .try_get("subscription_end")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let updated_at: String = row
        .try_get("updated_at")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;

    Ok(Subscriber {
        email,
        user_id,
        subscribed,
        is_trial,
        trial_end: parse_datetime_opt(trial_end.as_deref())?,
        subscription_tier,
        subscription_end: parse_datetime_opt(subscription_end.as_deref())?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

impl SqliteSubscriberStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriberStore for SqliteSubscriberStore {
    async fn get_subscriber(&self, email: &str) -> BotdeskResult<Option<Subscriber>> {
        let row = sqlx::query(
            "SELECT email, user_id, subscribed, is_trial, trial_end, subscription_tier,
                    subscription_end, updated_at
             FROM subscriber WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;

        match row {
            Some(ref r) => Ok(Some(row_to_subscriber(r)?)),
            None => Ok(None),
        }
    }

    async fn start_trial(&self, grant: &TrialGrant) -> BotdeskResult<bool> {
        // The WHERE on the conflict branch makes the grant conditional, so two
        // concurrent activations cannot both succeed.
        let result = sqlx::query(
            "INSERT INTO subscriber (email, user_id, subscribed, is_trial, trial_end,
                                     subscription_tier, subscription_end, updated_at)
             VALUES (?, ?, 0, 1, ?, NULL, NULL, ?)
             ON CONFLICT (email) DO UPDATE SET
                user_id = excluded.user_id,
                is_trial = 1,
                trial_end = excluded.trial_end,
                subscription_tier = NULL,
                subscription_end = NULL,
                updated_at = excluded.updated_at
             WHERE subscriber.subscribed = 0 AND subscriber.is_trial = 0",
        )
        .bind(&grant.email)
        .bind(&grant.user_id)
        .bind(format_datetime(&grant.trial_end))
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }
}
