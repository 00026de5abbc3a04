use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use botdesk_core::{BotdeskError, BotdeskResult, OnboardingProgressEntry, OnboardingStore, StepData};

#[derive(Clone)]
pub struct PostgresOnboardingStore {
    pool: PgPool,
}

fn row_to_entry(row: &sqlx::postgres::PgRow) -> Result<OnboardingProgressEntry, BotdeskError> {
    let user_id: String = row
        .try_get("user_id")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let step_id: String = row
        .try_get("step_id")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let completed_at: DateTime<Utc> = row
        .try_get("completed_at")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let Json(step_data): Json<StepData> = row
        .try_get("step_data")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;

    Ok(OnboardingProgressEntry {
        user_id,
        step_id,
        completed_at,
        step_data,
    })
}

impl PostgresOnboardingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OnboardingStore for PostgresOnboardingStore {
    async fn upsert_progress(
        &self,
        user_id: &str,
        step_id: &str,
        step_data: &StepData,
        completed_at: DateTime<Utc>,
    ) -> BotdeskResult<OnboardingProgressEntry> {
        let row = sqlx::query(
            "INSERT INTO onboarding_progress (user_id, step_id, completed_at, step_data)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, step_id) DO UPDATE SET
                completed_at = EXCLUDED.completed_at,
                step_data = EXCLUDED.step_data,
                seq = nextval('onboarding_progress_seq')
             RETURNING user_id, step_id, completed_at, step_data",
        )
        .bind(user_id)
        .bind(step_id)
        .bind(completed_at)
        .bind(Json(step_data))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;

        row_to_entry(&row)
    }

    async fn list_progress(&self, user_id: &str) -> BotdeskResult<Vec<OnboardingProgressEntry>> {
        let rows = sqlx::query(
            "SELECT user_id, step_id, completed_at, step_data FROM onboarding_progress
             WHERE user_id = $1 ORDER BY completed_at ASC, seq ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn last_completed_step(&self, user_id: &str) -> BotdeskResult<Option<String>> {
        let row = sqlx::query(
            "SELECT step_id FROM onboarding_progress
             WHERE user_id = $1 ORDER BY completed_at DESC, seq DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(
                r.try_get("step_id")
                    .map_err(|e| BotdeskError::Storage(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }
}
