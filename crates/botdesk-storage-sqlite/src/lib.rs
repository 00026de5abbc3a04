pub mod account;
mod datetime;
pub mod onboarding;
pub mod subscriber;

pub use account::SqliteAccountStore;
pub use onboarding::SqliteOnboardingStore;
pub use subscriber::SqliteSubscriberStore;

use botdesk_core::{BotdeskError, BotdeskResult};
use sqlx::SqlitePool;

/// Open a pool and bring the schema up to date. The returned pool can be
/// shared by every store via their `new` constructors.
pub async fn connect_pool(url: &str) -> BotdeskResult<SqlitePool> {
    let pool = SqlitePool::connect(url)
        .await
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;

    tracing::debug!("running sqlite migrations");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| BotdeskError::Storage(e.to_string()))?;

    Ok(pool)
}
