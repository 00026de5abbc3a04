use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::BotdeskResult;
use crate::types::{OnboardingProgressEntry, StepData};

#[async_trait]
pub trait OnboardingStore: Send + Sync + 'static {
    /// Record a completed step, replacing any previous entry for the same
    /// (user, step) pair.
    async fn upsert_progress(
        &self,
        user_id: &str,
        step_id: &str,
        step_data: &StepData,
        completed_at: DateTime<Utc>,
    ) -> BotdeskResult<OnboardingProgressEntry>;

    /// All entries for a user, oldest completion first.
    async fn list_progress(&self, user_id: &str) -> BotdeskResult<Vec<OnboardingProgressEntry>>;

    /// The most recently completed step id, if any.
    async fn last_completed_step(&self, user_id: &str) -> BotdeskResult<Option<String>>;
}
