use botdesk_core::{KnownStepData, OnboardingStore, StepData};
use botdesk_storage_sqlite::{SqliteOnboardingStore, connect_pool};
use chrono::{Duration, Utc};
use serde_json::json;
use tempfile::TempDir;

async fn setup() -> (SqliteOnboardingStore, TempDir) {
    let tempdir = TempDir::new().unwrap();
    let db_path = tempdir.path().join("test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let store = SqliteOnboardingStore::new(connect_pool(&db_url).await.unwrap());
    (store, tempdir)
}

#[tokio::test]
async fn empty_progress() {
    let (store, _dir) = setup().await;
    assert!(store.list_progress("u-1").await.unwrap().is_empty());
    assert!(store.last_completed_step("u-1").await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_replaces_same_step() {
    let (store, _dir) = setup().await;
    let first = StepData::Known(KnownStepData::BusinessProfile {
        company_name: "Acme".to_string(),
        website: None,
        extra: serde_json::Map::new(),
    });
    let second = StepData::Known(KnownStepData::BusinessProfile {
        company_name: "Acme Corp".to_string(),
        website: Some("https://acme.test".to_string()),
        extra: serde_json::Map::new(),
    });

    store.upsert_progress("u-1", "profile", &first, Utc::now()).await.unwrap();
    let entry = store.upsert_progress("u-1", "profile", &second, Utc::now()).await.unwrap();
    assert_eq!(entry.step_data, second);

    let all = store.list_progress("u-1").await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].step_data, second);
}

#[tokio::test]
async fn last_completed_step_follows_completion_time() {
    let (store, _dir) = setup().await;
    let now = Utc::now();
    let opaque = StepData::Opaque(json!({"answers": [1, 2]}));

    store.upsert_progress("u-1", "persona", &opaque, now - Duration::minutes(5)).await.unwrap();
    store.upsert_progress("u-1", "widget", &opaque, now).await.unwrap();
    store.upsert_progress("u-1", "profile", &opaque, now - Duration::minutes(10)).await.unwrap();
    store.upsert_progress("u-2", "later", &opaque, now + Duration::minutes(1)).await.unwrap();

    assert_eq!(store.last_completed_step("u-1").await.unwrap().as_deref(), Some("widget"));

    let steps: Vec<String> = store
        .list_progress("u-1")
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.step_id)
        .collect();
    assert_eq!(steps, vec!["profile", "persona", "widget"]);
}

#[tokio::test]
async fn opaque_payload_roundtrips() {
    let (store, _dir) = setup().await;
    let raw = json!({"kind": "survey", "score": 9});
    store
        .upsert_progress("u-1", "survey", &StepData::Opaque(raw.clone()), Utc::now())
        .await
        .unwrap();
    let entry = &store.list_progress("u-1").await.unwrap()[0];
    assert_eq!(entry.step_data, StepData::Opaque(raw));
}

#[tokio::test]
async fn known_payload_keeps_extra_fields() {
    let (store, _dir) = setup().await;
    let raw = json!({
        "kind": "business_profile",
        "company_name": "Acme",
        "industry": "retail",
        "locations": ["north", "south"],
    });
    let data: StepData = serde_json::from_value(raw.clone()).unwrap();
    assert!(matches!(data, StepData::Known(KnownStepData::BusinessProfile { .. })));

    store.upsert_progress("u-1", "profile", &data, Utc::now()).await.unwrap();

    let entry = &store.list_progress("u-1").await.unwrap()[0];
    assert_eq!(serde_json::to_value(&entry.step_data).unwrap(), raw);
}

#[tokio::test]
async fn same_instant_steps_follow_recording_order() {
    let (store, _dir) = setup().await;
    let at = Utc::now();
    let data = StepData::default();

    // Recorded in the reverse of alphabetical order on purpose.
    store.upsert_progress("u-1", "widget", &data, at).await.unwrap();
    store.upsert_progress("u-1", "business-profile", &data, at).await.unwrap();
    assert_eq!(
        store.last_completed_step("u-1").await.unwrap().as_deref(),
        Some("business-profile")
    );

    // Re-recording a step moves it to the end.
    store.upsert_progress("u-1", "widget", &data, at).await.unwrap();
    assert_eq!(store.last_completed_step("u-1").await.unwrap().as_deref(), Some("widget"));

    let steps: Vec<String> = store
        .list_progress("u-1")
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.step_id)
        .collect();
    assert_eq!(steps, vec!["business-profile", "widget"]);
}
