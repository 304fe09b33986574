mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::EntityTrait;

use hydronet::database::entities::datasets;
use hydronet::errors::{DatasetError, PermissionError};
use hydronet::services::{DatasetInput, DatasetService, DATA_LOCATION_KEY};
use hydronet::{MemoryValueStore, PermissionChecker, PermissionScope, StorageConfig};

use common::{build_services, setup_test_db};

#[tokio::test]
async fn test_add_dataset_never_reuses_rows() {
    let db = setup_test_db().await;
    let svc = build_services(&db, 4096);

    let first = svc
        .datasets
        .add_dataset(1, DatasetInput::scalar("flow", 42.0))
        .await
        .unwrap();
    let second = svc
        .datasets
        .add_dataset(1, DatasetInput::scalar("flow", 42.0))
        .await
        .unwrap();

    // identical content: same hash, but two distinct rows
    assert_ne!(first.id, second.id);
    assert_eq!(first.hash, second.hash);

    let all = datasets::Entity::find().all(&db).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_update_dataset_recomputes_hash() {
    let db = setup_test_db().await;
    let svc = build_services(&db, 4096);

    let dataset = svc
        .datasets
        .add_dataset(1, DatasetInput::scalar("flow", 1.5))
        .await
        .unwrap();
    let old_hash = dataset.hash.clone();

    let updated = svc
        .datasets
        .update_dataset(1, dataset.id, DatasetInput::scalar("flow", 2.5))
        .await
        .unwrap();

    assert_eq!(updated.id, dataset.id);
    assert_ne!(updated.hash, old_hash);
    assert_eq!(updated.value, "2.5");
}

#[tokio::test]
async fn test_metadata_changes_the_hash() {
    let db = setup_test_db().await;
    let svc = build_services(&db, 4096);

    let plain = svc
        .datasets
        .add_dataset(1, DatasetInput::scalar("flow", 42.0))
        .await
        .unwrap();

    let mut input = DatasetInput::scalar("flow", 42.0);
    input
        .metadata
        .insert("source".to_string(), "observed".to_string());
    let tagged = svc.datasets.add_dataset(1, input).await.unwrap();

    assert_ne!(plain.hash, tagged.hash);
}

#[tokio::test]
async fn test_large_value_offloads_to_external_store() {
    let db = setup_test_db().await;
    let svc = build_services(&db, 16);

    let payload = "x".repeat(100);
    let dataset = svc
        .datasets
        .add_dataset(1, DatasetInput::scalar("series", &payload))
        .await
        .unwrap();

    // the row holds a store key and a location marker, not the payload
    assert_ne!(dataset.value, payload);
    assert!(dataset.metadata.contains(DATA_LOCATION_KEY));
    assert_eq!(svc.store.len(), 1);

    let resolved = svc.datasets.get_dataset(1, dataset.id).await.unwrap();
    assert_eq!(resolved.value, payload);
}

#[tokio::test]
async fn test_offload_hash_matches_inline_hash() {
    let db = setup_test_db().await;
    let small_threshold = build_services(&db, 16);
    let large_threshold = build_services(&db, 4096);

    let payload = "y".repeat(64);
    let offloaded = small_threshold
        .datasets
        .add_dataset(1, DatasetInput::scalar("series", &payload))
        .await
        .unwrap();
    let inline = large_threshold
        .datasets
        .add_dataset(1, DatasetInput::scalar("series", &payload))
        .await
        .unwrap();

    // the fingerprint covers the payload, wherever it is stored
    assert_eq!(offloaded.hash, inline.hash);
}

#[tokio::test]
async fn test_update_moves_value_across_threshold() {
    let db = setup_test_db().await;
    let svc = build_services(&db, 16);

    let big = "z".repeat(100);
    let dataset = svc
        .datasets
        .add_dataset(1, DatasetInput::scalar("series", &big))
        .await
        .unwrap();
    assert_eq!(svc.store.len(), 1);

    // shrink below the threshold: the external copy is deleted
    let updated = svc
        .datasets
        .update_dataset(1, dataset.id, DatasetInput::scalar("series", "tiny"))
        .await
        .unwrap();
    assert_eq!(updated.value, "tiny");
    assert!(!updated.metadata.contains(DATA_LOCATION_KEY));
    assert!(svc.store.is_empty());

    // grow again: a fresh key is allocated
    let regrown = svc
        .datasets
        .update_dataset(1, dataset.id, DatasetInput::scalar("series", &big))
        .await
        .unwrap();
    assert_ne!(regrown.value, big);
    assert_eq!(svc.store.len(), 1);
}

struct DenyAll;

#[async_trait]
impl PermissionChecker for DenyAll {
    async fn check_read(
        &self,
        user_id: i32,
        scope: PermissionScope,
    ) -> Result<(), PermissionError> {
        Err(PermissionError::denied(user_id, "read", scope.to_string()))
    }

    async fn check_write(
        &self,
        user_id: i32,
        scope: PermissionScope,
    ) -> Result<(), PermissionError> {
        Err(PermissionError::denied(user_id, "write", scope.to_string()))
    }
}

#[tokio::test]
async fn test_hidden_dataset_requires_permission() {
    let db = setup_test_db().await;
    let denying = DatasetService::new(
        db.clone(),
        Arc::new(MemoryValueStore::new()),
        StorageConfig::default(),
        Arc::new(DenyAll),
    );

    let mut input = DatasetInput::scalar("secret", 7);
    input.hidden = true;
    input.metadata = BTreeMap::new();
    let dataset = denying.add_dataset(1, input).await.unwrap();

    // the creator still reads it
    assert!(denying.get_dataset(1, dataset.id).await.is_ok());

    // anyone else is rejected by the injected checker
    let err = denying.get_dataset(2, dataset.id).await.unwrap_err();
    assert!(matches!(err, DatasetError::Permission(_)));
}
