//! External large-value storage
//!
//! Dataset values above a configured byte threshold are not kept in the
//! relational row; they move to an external key/value store (Mongo, HDF, S3
//! or similar in production). The relational row keeps only the store key.
//! The store is accessed outside the enclosing database transaction, so a
//! crash between the two writes can leave a dangling key or an unreferenced
//! value; callers accept that window.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::DatasetError;

/// Size threshold configuration for external offload.
#[derive(Clone, Copy, Debug)]
pub struct StorageConfig {
    /// Values whose UTF-8 byte length exceeds this move to the external store.
    pub threshold: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Matches a few KiB of inline text before offloading.
        Self { threshold: 4096 }
    }
}

#[async_trait]
pub trait ValueStore: Send + Sync {
    /// Fetch the value stored under `key`.
    async fn get(&self, key: &str) -> Result<String, DatasetError>;

    /// Store `value` under an existing `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<(), DatasetError>;

    /// Remove the value stored under `key`.
    async fn delete(&self, key: &str) -> Result<(), DatasetError>;

    /// Store `value` under a newly allocated key and return the key.
    async fn insert(&self, value: String) -> Result<String, DatasetError>;
}

/// In-process value store used by tests and single-process embeddings.
#[derive(Debug, Default)]
pub struct MemoryValueStore {
    values: Mutex<HashMap<String, String>>,
    next_key: AtomicU64,
}

impl MemoryValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values. Test hook.
    pub fn len(&self) -> usize {
        self.values.lock().expect("value store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ValueStore for MemoryValueStore {
    async fn get(&self, key: &str) -> Result<String, DatasetError> {
        let values = self
            .values
            .lock()
            .map_err(|e| DatasetError::Storage(e.to_string()))?;
        values
            .get(key)
            .cloned()
            .ok_or_else(|| DatasetError::MissingExternalValue(key.to_string()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), DatasetError> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| DatasetError::Storage(e.to_string()))?;
        values.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DatasetError> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| DatasetError::Storage(e.to_string()))?;
        values.remove(key);
        Ok(())
    }

    async fn insert(&self, value: String) -> Result<String, DatasetError> {
        let key = format!("v{}", self.next_key.fetch_add(1, Ordering::SeqCst));
        self.set(&key, value).await?;
        Ok(key)
    }
}
