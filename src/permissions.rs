//! Injected permission checking capability
//!
//! The core never decides who may read or write; it asks an implementation of
//! [`PermissionChecker`] before touching any row. Every public service
//! operation takes a `user_id` and calls `check_read`/`check_write` with the
//! scope it is about to act on. The embedding service layer supplies the real
//! implementation; [`AllowAll`] is provided for tests and single-user
//! embeddings.

use std::fmt;

use async_trait::async_trait;

use crate::errors::PermissionError;

/// The entity a permission check is scoped to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionScope {
    Project(i32),
    Network(i32),
    Scenario(i32),
    Dataset(i32),
}

impl fmt::Display for PermissionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionScope::Project(id) => write!(f, "project {}", id),
            PermissionScope::Network(id) => write!(f, "network {}", id),
            PermissionScope::Scenario(id) => write!(f, "scenario {}", id),
            PermissionScope::Dataset(id) => write!(f, "dataset {}", id),
        }
    }
}

#[async_trait]
pub trait PermissionChecker: Send + Sync {
    /// Fails with [`PermissionError::Denied`] when the user may not read the scope.
    async fn check_read(&self, user_id: i32, scope: PermissionScope)
        -> Result<(), PermissionError>;

    /// Fails with [`PermissionError::Denied`] when the user may not write the scope.
    async fn check_write(
        &self,
        user_id: i32,
        scope: PermissionScope,
    ) -> Result<(), PermissionError>;
}

/// Permission checker that grants everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

#[async_trait]
impl PermissionChecker for AllowAll {
    async fn check_read(
        &self,
        _user_id: i32,
        _scope: PermissionScope,
    ) -> Result<(), PermissionError> {
        Ok(())
    }

    async fn check_write(
        &self,
        _user_id: i32,
        _scope: PermissionScope,
    ) -> Result<(), PermissionError> {
        Ok(())
    }
}
