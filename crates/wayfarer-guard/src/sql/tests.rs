//! Tests for the SQL record store.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::model::{ExperienceRecord, ImageRecord, Metadata, UserProfile};
use crate::sql::{DatabaseType, SqlStore, SqlStoreConfig};
use crate::tier::Tier;
use crate::{GuardError, RecordStore};

/// Create a test SqlStore with in-memory SQLite.
async fn setup_test_db() -> SqlStore {
    let config = SqlStoreConfig::new("sqlite::memory:")
        .max_connections(1)
        .init_schema(true);

    SqlStore::connect(config).await.expect("Failed to connect")
}

fn image(id: &str, owner: &str, size: u64, created_at: i64) -> ImageRecord {
    ImageRecord {
        id: id.into(),
        owner_id: owner.into(),
        storage_path: format!("{owner}/{id}.jpg"),
        experience_id: None,
        metadata: Metadata::new(),
        size_bytes: size,
        created_at,
        updated_at: created_at,
    }
}

async fn insert_profile(store: &SqlStore, id: &str, tier: Tier, used: u64) {
    let profile = UserProfile::new(id, tier).with_storage_used(used);
    assert!(store.insert_profile_if_absent(&profile).await.unwrap());
}

#[tokio::test]
async fn test_database_type_detection() {
    assert_eq!(
        DatabaseType::from_url("postgres://localhost/db"),
        Some(DatabaseType::PostgreSQL)
    );
    assert_eq!(
        DatabaseType::from_url("postgresql://localhost/db"),
        Some(DatabaseType::PostgreSQL)
    );
    assert_eq!(
        DatabaseType::from_url("sqlite::memory:"),
        Some(DatabaseType::SQLite)
    );
    assert_eq!(DatabaseType::from_url("mysql://localhost/db"), None);
    assert_eq!(DatabaseType::from_url("invalid://localhost"), None);
}

#[tokio::test]
async fn test_invalid_database_url() {
    let err = SqlStore::connect(SqlStoreConfig::new("invalid://x"))
        .await
        .unwrap_err();
    assert!(matches!(err, GuardError::Configuration(_)));
}

#[tokio::test]
async fn test_profile_insert_if_absent() {
    let store = setup_test_db().await;
    insert_profile(&store, "alice", Tier::Explorer, 42).await;

    let again = UserProfile::new("alice", Tier::Free);
    assert!(!store.insert_profile_if_absent(&again).await.unwrap());

    let p = store.get_profile("alice").await.unwrap().unwrap();
    assert_eq!(p.subscription_tier, "explorer");
    assert_eq!(p.storage_used_bytes, 42);
    assert_eq!(p.email, None);
    assert!(store.get_profile("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn test_set_subscription_tier() {
    let store = setup_test_db().await;
    insert_profile(&store, "alice", Tier::Free, 0).await;

    assert!(store.set_subscription_tier("alice", "traveler").await.unwrap());
    assert!(!store.set_subscription_tier("ghost", "traveler").await.unwrap());
    let p = store.get_profile("alice").await.unwrap().unwrap();
    assert_eq!(p.tier(), Some(Tier::Traveler));
}

#[tokio::test]
async fn test_add_storage_used_accumulates() {
    let store = setup_test_db().await;
    insert_profile(&store, "alice", Tier::Free, 1_000).await;

    let c = store.add_storage_used("alice", 500).await.unwrap().unwrap();
    assert_eq!(c.used_bytes, 1_500);
    assert!(!c.clamped());
    let c = store.add_storage_used("alice", -200).await.unwrap().unwrap();
    assert_eq!(c.used_bytes, 1_300);
}

#[tokio::test]
async fn test_add_storage_used_clamps_at_zero() {
    let store = setup_test_db().await;
    insert_profile(&store, "alice", Tier::Free, 100).await;

    let c = store.add_storage_used("alice", -250).await.unwrap().unwrap();
    assert_eq!(c.used_bytes, 0);
    assert_eq!(c.clamped_bytes, 150);

    // Clamp amount is per-commit, not sticky.
    let c = store.add_storage_used("alice", 10).await.unwrap().unwrap();
    assert_eq!(c.used_bytes, 10);
    assert_eq!(c.clamped_bytes, 0);
}

#[tokio::test]
async fn test_add_storage_used_unknown_user() {
    let store = setup_test_db().await;
    assert!(store.add_storage_used("ghost", 10).await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_commits_accumulate() {
    let store = Arc::new(setup_test_db().await);
    insert_profile(&store, "alice", Tier::Free, 0).await;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.add_storage_used("alice", 100).await.unwrap();
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let p = store.get_profile("alice").await.unwrap().unwrap();
    assert_eq!(p.storage_used_bytes, 2_000);
}

#[tokio::test]
async fn test_image_queries_filter_by_owner() {
    let store = setup_test_db().await;
    store.insert_image(&image("a", "alice", 10, 1)).await.unwrap();
    store.insert_image(&image("b", "alice", 20, 2)).await.unwrap();
    store.insert_image(&image("c", "bob", 30, 3)).await.unwrap();

    assert!(store.get_image("alice", "a").await.unwrap().is_some());
    assert!(store.get_image("alice", "c").await.unwrap().is_none());
    assert!(
        store
            .find_image_by_path("alice", "bob/c.jpg")
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        store
            .find_image_by_path("alice", "alice/a")
            .await
            .unwrap()
            .is_none(),
        "prefix must not match"
    );

    let list = store.list_images("alice").await.unwrap();
    let ids: Vec<_> = list.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);

    let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    assert_eq!(store.count_owned_images("alice", &ids).await.unwrap(), 2);
    assert_eq!(store.count_owned_images("bob", &ids).await.unwrap(), 1);
    assert_eq!(store.count_owned_images("bob", &[]).await.unwrap(), 0);
}

#[tokio::test]
async fn test_update_metadata_only_touches_owned() {
    let store = setup_test_db().await;
    store.insert_image(&image("a", "alice", 10, 1)).await.unwrap();
    store.insert_image(&image("c", "bob", 30, 3)).await.unwrap();

    let metadata = json!({"caption": "Lisbon", "tags": ["tram"]})
        .as_object()
        .cloned()
        .unwrap();
    let ids = vec!["a".to_string(), "c".to_string()];
    let updated = store
        .update_image_metadata("alice", &ids, &metadata, 99)
        .await
        .unwrap();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].metadata["caption"], "Lisbon");
    assert_eq!(updated[0].updated_at, 99);

    let c = store.get_image("bob", "c").await.unwrap().unwrap();
    assert!(c.metadata.is_empty());
}

#[tokio::test]
async fn test_set_experience_and_delete() {
    let store = setup_test_db().await;
    store.insert_image(&image("a", "alice", 10, 1)).await.unwrap();

    let moved = store
        .set_image_experience("alice", "a", Some("exp1"), 5)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(moved.experience_id.as_deref(), Some("exp1"));

    let cleared = store
        .set_image_experience("alice", "a", None, 6)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cleared.experience_id, None);

    assert!(
        store
            .set_image_experience("bob", "a", None, 7)
            .await
            .unwrap()
            .is_none()
    );

    assert!(store.delete_image("bob", "a").await.unwrap().is_none());
    let deleted = store.delete_image("alice", "a").await.unwrap().unwrap();
    assert_eq!(deleted.size_bytes, 10);
    assert!(store.get_image("alice", "a").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_storage_path_rejected() {
    let store = setup_test_db().await;
    store.insert_image(&image("a", "alice", 10, 1)).await.unwrap();
    let mut dup = image("b", "alice", 10, 1);
    dup.storage_path = "alice/a.jpg".into();
    let err = store.insert_image(&dup).await.unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_experiences() {
    let store = setup_test_db().await;
    for (id, owner, at) in [("e1", "alice", 2), ("e0", "alice", 1), ("e2", "bob", 3)] {
        store
            .insert_experience(&ExperienceRecord {
                id: id.into(),
                owner_id: owner.into(),
                title: format!("Trip {id}"),
                created_at: at,
            })
            .await
            .unwrap();
    }

    assert_eq!(store.count_experiences("alice").await.unwrap(), 2);
    let list = store.list_experiences("alice").await.unwrap();
    assert_eq!(list[0].id, "e0");
    assert!(store.get_experience("alice", "e2").await.unwrap().is_none());
    assert!(store.get_experience("bob", "e2").await.unwrap().is_some());
}

#[tokio::test]
async fn test_reconcile_usage() {
    let store = setup_test_db().await;
    insert_profile(&store, "alice", Tier::Free, 9_999).await;
    insert_profile(&store, "bob", Tier::Free, 5).await;
    store.insert_image(&image("a", "alice", 10, 1)).await.unwrap();
    store.insert_image(&image("b", "alice", 20, 2)).await.unwrap();

    assert_eq!(store.reconcile_usage().await.unwrap(), 2);
    let profiles = store.list_profiles().await.unwrap();
    let used: Vec<_> = profiles
        .iter()
        .map(|p| (p.id.as_str(), p.storage_used_bytes))
        .collect();
    assert!(used.contains(&("alice", 30)));
    assert!(used.contains(&("bob", 0)));
}

#[tokio::test]
async fn test_config_builder() {
    let config = SqlStoreConfig::new("sqlite::memory:")
        .max_connections(20)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(10))
        .init_schema(true);

    assert_eq!(config.database_url, "sqlite::memory:");
    assert_eq!(config.max_connections, 20);
    assert_eq!(config.min_connections, 5);
    assert_eq!(config.connect_timeout, Duration::from_secs(10));
    assert!(config.init_schema);
}

#[tokio::test]
async fn test_debug_impl_hides_credentials() {
    let store = SqlStore::connect(
        SqlStoreConfig::new("sqlite::memory:").max_connections(1),
    )
    .await
    .unwrap();
    let debug = format!("{store:?}");
    assert!(debug.contains("SQLite"));
    assert!(!debug.contains("memory"));
}
