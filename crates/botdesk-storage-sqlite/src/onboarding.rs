use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use botdesk_core::{BotdeskError, BotdeskResult, OnboardingProgressEntry, OnboardingStore, StepData};

use crate::datetime::{format_datetime, parse_datetime};

#[derive(Clone)]
pub struct SqliteOnboardingStore {
    pool: SqlitePool,
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<OnboardingProgressEntry, BotdeskError> {
    let user_id: String = row
        .try_get("user_id")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let step_id: String = row
        .try_get("step_id")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let completed_at: String = row
        .try_get("completed_at")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;
    let step_data: String = row
        .try_get("step_data")
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;

    Ok(OnboardingProgressEntry {
        user_id,
        step_id,
        completed_at: parse_datetime(&completed_at)?,
        step_data: serde_json::from_str(&step_data)
            .map_err(|e| BotdeskError::Storage(format!("corrupt step_data: {e}")))?,
    })
}

impl SqliteOnboardingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OnboardingStore for SqliteOnboardingStore {
    async fn upsert_progress(
        &self,
        user_id: &str,
        step_id: &str,
        step_data: &StepData,
        completed_at: DateTime<Utc>,
    ) -> BotdeskResult<OnboardingProgressEntry> {
        let payload = serde_json::to_string(step_data)
            .map_err(|e| BotdeskError::InvalidRequest(e.to_string()))?;

        // SQLite serializes writers, so MAX(seq) + 1 is unique per statement.
        let row = sqlx::query(
            "INSERT INTO onboarding_progress (user_id, step_id, completed_at, step_data, seq)
             VALUES (?, ?, ?, ?, (SELECT COALESCE(MAX(seq), 0) + 1 FROM onboarding_progress))
             ON CONFLICT (user_id, step_id) DO UPDATE SET
                completed_at = excluded.completed_at,
                step_data = excluded.step_data,
                seq = excluded.seq
             RETURNING user_id, step_id, completed_at, step_data",
        )
        .bind(user_id)
        .bind(step_id)
        .bind(format_datetime(&completed_at))
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;

        row_to_entry(&row)
    }

    async fn list_progress(&self, user_id: &str) -> BotdeskResult<Vec<OnboardingProgressEntry>> {
        let rows = sqlx::query(
            "SELECT user_id, step_id, completed_at, step_data FROM onboarding_progress
             WHERE user_id = ? ORDER BY completed_at ASC, seq ASC",
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
             WHERE user_id = ? ORDER BY completed_at DESC, seq DESC LIMIT 1",
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
