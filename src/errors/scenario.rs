//! Scenario-related error types
//!
//! Covers scenario lookup, name conflicts, the cooperative lock flag, and
//! cross-network validation performed by clone/merge/compare operations.

use thiserror::Error;

use super::{DatasetError, PermissionError};

/// Scenario-related errors
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// Scenario not found by ID
    #[error("Scenario {0} not found")]
    NotFound(i32),

    /// Network not found by ID
    #[error("Network {0} not found")]
    NetworkNotFound(i32),

    /// Resource scenario binding not found
    #[error("Scenario {scenario_id} has no value bound for resource attribute {resource_attr_id}")]
    BindingNotFound {
        scenario_id: i32,
        resource_attr_id: i32,
    },

    /// Scenario name already used within the network
    #[error("Scenario '{name}' already exists in network {network_id}")]
    NameConflict { network_id: i32, name: String },

    /// Scenario is locked against edits
    #[error("Scenario {0} is locked")]
    Locked(i32),

    /// Operation requires all scenarios to share one network
    #[error("Scenarios span multiple networks: {0}")]
    NetworkMismatch(String),

    /// Merge could not match every named resource
    #[error("Unmatched resource names: {}", .0.join(", "))]
    UnmatchedResources(Vec<String>),

    /// Resource attribute not found by ID
    #[error("Resource attribute {0} not found")]
    ResourceAttrNotFound(i32),

    /// Resource group not found by ID
    #[error("Resource group {0} not found")]
    GroupNotFound(i32),

    /// Group item references no resource or the wrong kind of resource
    #[error("Invalid group item: {0}")]
    InvalidGroupItem(String),

    /// Status flag is not one of the accepted values
    #[error("Invalid scenario status '{0}'")]
    InvalidStatus(String),

    /// Attribute lookup or creation failed during a merge
    #[error(transparent)]
    Attribute(#[from] crate::errors::AttributeError),

    /// Permission denied
    #[error(transparent)]
    Permission(#[from] PermissionError),

    /// Dataset operation failed while assigning a value
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}
