pub mod account;
pub mod onboarding;
pub mod subscriber;

pub use account::PostgresAccountStore;
pub use onboarding::PostgresOnboardingStore;
pub use subscriber::PostgresSubscriberStore;

use botdesk_core::{BotdeskError, BotdeskResult};
use sqlx::PgPool;

/// Open a pool and bring the schema up to date.
pub async fn connect_pool(url: &str) -> BotdeskResult<PgPool> {
    let pool = PgPool::connect(url)
        .await
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;

    tracing::debug!("running postgres migrations");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;

    Ok(pool)
}
