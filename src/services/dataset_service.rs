//! Dataset storage: typed value rows, content hashing, external offload
//!
//! Datasets are immutable by convention and shared freely between
//! resource-scenario bindings; whether a write may mutate a row in place is
//! decided by the caller (see the scenario service's assign-value path), not
//! here. `add_dataset` therefore always creates a new row, even when an
//! identical hash already exists.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::database::entities::common_types::DataType;
use crate::database::entities::datasets;
use crate::errors::{DatasetError, DatasetResult};
use crate::permissions::{PermissionChecker, PermissionScope};
use crate::value_store::{StorageConfig, ValueStore};

/// Metadata key marking a value held in the external store. The relational
/// `value` column then holds the store key instead of the payload.
pub const DATA_LOCATION_KEY: &str = "data_location";
const DATA_LOCATION_EXTERNAL: &str = "external";

/// Input for creating or rewriting a dataset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatasetInput {
    pub data_type: DataType,
    pub name: String,
    pub value: String,
    pub unit_id: Option<i32>,
    pub metadata: BTreeMap<String, String>,
    pub hidden: bool,
}

impl DatasetInput {
    pub fn scalar(name: &str, value: impl ToString) -> Self {
        Self {
            data_type: DataType::Scalar,
            name: name.to_string(),
            value: value.to_string(),
            unit_id: None,
            metadata: BTreeMap::new(),
            hidden: false,
        }
    }
}

/// Content fingerprint of a (value, metadata) pair.
///
/// The metadata map is serialized with sorted keys so the digest is stable,
/// and the location marker is never part of the digest: a value hashes the
/// same whether it lives inline or in the external store.
pub fn dataset_hash(value: &str, metadata: &BTreeMap<String, String>) -> DatasetResult<String> {
    let canonical = canonical_metadata(metadata)?;
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hasher.update([0x1f]);
    hasher.update(canonical.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

fn canonical_metadata(metadata: &BTreeMap<String, String>) -> DatasetResult<String> {
    serde_json::to_string(metadata).map_err(|e| DatasetError::InvalidValue(e.to_string()))
}

fn metadata_map(json: &str) -> DatasetResult<BTreeMap<String, String>> {
    if json.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(json).map_err(|e| DatasetError::InvalidValue(e.to_string()))
}

fn is_external(metadata: &BTreeMap<String, String>) -> bool {
    metadata.get(DATA_LOCATION_KEY).map(String::as_str) == Some(DATA_LOCATION_EXTERNAL)
}

/// Service for dataset rows and their externally stored payloads.
#[derive(Clone)]
pub struct DatasetService {
    db: DatabaseConnection,
    store: Arc<dyn ValueStore>,
    config: StorageConfig,
    permissions: Arc<dyn PermissionChecker>,
}

impl DatasetService {
    pub fn new(
        db: DatabaseConnection,
        store: Arc<dyn ValueStore>,
        config: StorageConfig,
        permissions: Arc<dyn PermissionChecker>,
    ) -> Self {
        Self {
            db,
            store,
            config,
            permissions,
        }
    }

    /// Create a dataset row. Always inserts; hash-equal rows are never reused
    /// implicitly.
    pub async fn add_dataset(
        &self,
        user_id: i32,
        input: DatasetInput,
    ) -> DatasetResult<datasets::Model> {
        self.insert_dataset_row(&self.db, Some(user_id), &input)
            .await
    }

    /// Rewrite an existing dataset in place, recomputing its hash and moving
    /// the payload into or out of the external store as the size crosses the
    /// threshold.
    pub async fn update_dataset(
        &self,
        user_id: i32,
        dataset_id: i32,
        input: DatasetInput,
    ) -> DatasetResult<datasets::Model> {
        let existing = datasets::Entity::find_by_id(dataset_id)
            .one(&self.db)
            .await?
            .ok_or(DatasetError::NotFound(dataset_id))?;

        if existing.hidden && existing.created_by != Some(user_id) {
            self.permissions
                .check_write(user_id, PermissionScope::Dataset(dataset_id))
                .await?;
        }

        self.update_dataset_row(&self.db, existing, &input).await
    }

    /// Fetch a dataset with its payload resolved from the external store when
    /// offloaded.
    pub async fn get_dataset(
        &self,
        user_id: i32,
        dataset_id: i32,
    ) -> DatasetResult<datasets::Model> {
        let dataset = datasets::Entity::find_by_id(dataset_id)
            .one(&self.db)
            .await?
            .ok_or(DatasetError::NotFound(dataset_id))?;
        self.resolve_for_user(user_id, dataset).await
    }

    /// Hidden-visibility gate plus payload resolution, for callers that
    /// already hold the row. Hidden datasets short-circuit for their creator;
    /// anyone else goes through the permission checker.
    pub(crate) async fn resolve_for_user(
        &self,
        user_id: i32,
        dataset: datasets::Model,
    ) -> DatasetResult<datasets::Model> {
        if dataset.hidden && dataset.created_by != Some(user_id) {
            self.permissions
                .check_read(user_id, PermissionScope::Dataset(dataset.id))
                .await?;
        }
        self.resolve_value(dataset).await
    }

    /// Datasets matching a content hash. Callers use this for explicit reuse
    /// decisions; nothing here dedupes automatically.
    pub async fn get_datasets_by_hash(&self, hash: &str) -> DatasetResult<Vec<datasets::Model>> {
        Ok(datasets::Entity::find()
            .filter(datasets::Column::Hash.eq(hash))
            .all(&self.db)
            .await?)
    }

    /// Insert many datasets in one transaction.
    pub async fn bulk_insert_data(
        &self,
        user_id: i32,
        inputs: Vec<DatasetInput>,
    ) -> DatasetResult<Vec<datasets::Model>> {
        let txn = self.db.begin().await?;
        let mut created = Vec::with_capacity(inputs.len());
        for input in &inputs {
            created.push(self.insert_dataset_row(&txn, Some(user_id), input).await?);
        }
        txn.commit().await?;
        Ok(created)
    }

    /// Replace an offloaded payload with the inline value for presentation.
    pub async fn resolve_value(&self, mut dataset: datasets::Model) -> DatasetResult<datasets::Model> {
        let metadata = metadata_map(&dataset.metadata)?;
        if is_external(&metadata) {
            dataset.value = self.store.get(&dataset.value).await?;
        }
        Ok(dataset)
    }

    pub(crate) async fn insert_dataset_row<C: ConnectionTrait>(
        &self,
        conn: &C,
        created_by: Option<i32>,
        input: &DatasetInput,
    ) -> DatasetResult<datasets::Model> {
        let hash = dataset_hash(&input.value, &input.metadata)?;
        let (stored_value, stored_metadata) = self.offload_value(input).await?;

        let now = Utc::now();
        let dataset = datasets::ActiveModel {
            data_type: Set(input.data_type.as_str().to_string()),
            name: Set(input.name.clone()),
            value: Set(stored_value),
            unit_id: Set(input.unit_id),
            hash: Set(hash),
            hidden: Set(input.hidden),
            metadata: Set(stored_metadata),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let dataset = dataset.insert(conn).await?;
        debug!(dataset_id = dataset.id, hash = %dataset.hash, "created dataset");
        Ok(dataset)
    }

    pub(crate) async fn update_dataset_row<C: ConnectionTrait>(
        &self,
        conn: &C,
        existing: datasets::Model,
        input: &DatasetInput,
    ) -> DatasetResult<datasets::Model> {
        let hash = dataset_hash(&input.value, &input.metadata)?;
        let old_metadata = metadata_map(&existing.metadata)?;
        let was_external = is_external(&old_metadata);
        let goes_external = input.value.len() > self.config.threshold;

        let (stored_value, stored_metadata) = match (was_external, goes_external) {
            (true, true) => {
                // Key stays stable across rewrites of an offloaded value.
                let key = existing.value.clone();
                self.store.set(&key, input.value.clone()).await?;
                (key, self.external_metadata(input)?)
            }
            (true, false) => {
                self.store.delete(&existing.value).await?;
                (input.value.clone(), canonical_metadata(&input.metadata)?)
            }
            (false, _) => self.offload_value(input).await?,
        };

        let dataset_id = existing.id;
        let mut active: datasets::ActiveModel = existing.into();
        active.data_type = Set(input.data_type.as_str().to_string());
        active.name = Set(input.name.clone());
        active.value = Set(stored_value);
        active.unit_id = Set(input.unit_id);
        active.hash = Set(hash);
        active.hidden = Set(input.hidden);
        active.metadata = Set(stored_metadata);
        active.updated_at = Set(Utc::now());

        let updated = active.update(conn).await?;
        debug!(dataset_id, hash = %updated.hash, "updated dataset in place");
        Ok(updated)
    }

    /// Move the payload to the external store when it crosses the threshold.
    /// Returns the column value and serialized metadata to persist.
    async fn offload_value(&self, input: &DatasetInput) -> DatasetResult<(String, String)> {
        if input.value.len() > self.config.threshold {
            let key = self.store.insert(input.value.clone()).await?;
            debug!(key = %key, size = input.value.len(), "offloaded dataset value");
            Ok((key, self.external_metadata(input)?))
        } else {
            Ok((input.value.clone(), canonical_metadata(&input.metadata)?))
        }
    }

    fn external_metadata(&self, input: &DatasetInput) -> DatasetResult<String> {
        let mut metadata = input.metadata.clone();
        metadata.insert(
            DATA_LOCATION_KEY.to_string(),
            DATA_LOCATION_EXTERNAL.to_string(),
        );
        canonical_metadata(&metadata)
    }
}
