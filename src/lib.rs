pub mod database;
pub mod errors;
pub mod hierarchy;
pub mod permissions;
pub mod services;
pub mod value_store;

pub use permissions::{AllowAll, PermissionChecker, PermissionScope};
pub use value_store::{MemoryValueStore, StorageConfig, ValueStore};
