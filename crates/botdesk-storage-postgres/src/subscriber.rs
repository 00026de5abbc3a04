use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use botdesk_core::{BotdeskError, BotdeskResult, Subscriber, SubscriberStore, TrialGrant};

#[derive(Clone)]
pub struct PostgresSubscriberStore {
    pool: PgPool,
}

fn row_to_subscriber(row: &sqlx::postgres::PgRow) -> Result<Subscriber, BotdeskError> {
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
    let trial_end: Option<DateTime<Utc>> = row
        .try_get("trial_end")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let subscription_tier: Option<String> = row
        .try_get("subscription_tier")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let subscription_end: Option<DateTime<Utc>> = row
        .try_get("subscription_end")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let updated_at: DateTime<Utc> = row
        .try_get("updated_at")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;

    Ok(Subscriber {
        email,
        user_id,
        subscribed,
        is_trial,
        trial_end,
        subscription_tier,
        subscription_end,
        updated_at,
    })
}

impl PostgresSubscriberStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriberStore for PostgresSubscriberStore {
    async fn get_subscriber(&self, email: &str) -> BotdeskResult<Option<Subscriber>> {
        let row = sqlx::query(
            "SELECT email, user_id, subscribed, is_trial, trial_end, subscription_tier,
                    subscription_end, updated_at
             FROM subscriber WHERE email = $1",
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
        let result = sqlx::query(
            "INSERT INTO subscriber (email, user_id, subscribed, is_trial, trial_end,
                                     subscription_tier, subscription_end, updated_at)
             VALUES ($1, $2, FALSE, TRUE, $3, NULL, NULL, NOW())
             ON CONFLICT (email) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                is_trial = TRUE,
                trial_end = EXCLUDED.trial_end,
                subscription_tier = NULL,
                subscription_end = NULL,
                updated_at = NOW()
             WHERE NOT subscriber.subscribed AND NOT subscriber.is_trial",
        )
        .bind(&grant.email)
        .bind(&grant.user_id)
        .bind(grant.trial_end)
        .execute(&self.pool)
        .await
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }
}
