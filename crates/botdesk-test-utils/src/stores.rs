use sqlx::SqlitePool;
use tempfile::TempDir;

use botdesk_storage_sqlite::{
    SqliteAccountStore, SqliteOnboardingStore, SqliteSubscriberStore, connect_pool,
};

pub struct TestStores {
    pub account_store: SqliteAccountStore,
    pub subscriber_store: SqliteSubscriberStore,
    pub onboarding_store: SqliteOnboardingStore,
    /// Raw handle for seeding rows the stores never write, such as paid plans.
    pub pool: SqlitePool,
    /// Hold the TempDir to keep it alive for the test's duration.
    pub _tempdir: TempDir,
}

/// Create a fresh set of stores sharing one migrated SQLite file in a tempdir.
pub async fn create_test_stores() -> TestStores {
    let tempdir = TempDir::new().expect("failed to create tempdir");
    let db_path = tempdir.path().join("test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let pool = connect_pool(&db_url).await.expect("failed to open test database");

    TestStores {
        account_store: SqliteAccountStore::new(pool.clone()),
        subscriber_store: SqliteSubscriberStore::new(pool.clone()),
        onboarding_store: SqliteOnboardingStore::new(pool.clone()),
        pool,
        _tempdir: tempdir,
    }
}

/// Write a subscriber row directly, as the billing provider would.
/// `subscribed` rows get a subscription ending 30 days from now; others get none.
pub async fn insert_subscriber(
    stores: &TestStores,
    email: &str,
    user_id: Option<&str>,
    subscribed: bool,
    tier: Option<&str>,
) {
    sqlx::query(
        "INSERT INTO subscriber (email, user_id, subscribed, is_trial, subscription_tier,
                                 subscription_end)
         VALUES (?, ?, ?, 0, ?,
                 CASE WHEN ? THEN strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '+30 days') END)",
    )
    .bind(email)
    .bind(user_id)
    .bind(subscribed)
    .bind(tier)
    .bind(subscribed)
    .execute(&stores.pool)
    .await
    .expect("failed to insert subscriber");
}
