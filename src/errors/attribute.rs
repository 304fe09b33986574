//! Attribute-related error types
//!
//! Covers global attribute definitions, per-resource attachment, cross-network
//! mapping, and attribute-group exclusivity.

use thiserror::Error;

use super::PermissionError;

/// Attribute-related errors
#[derive(Error, Debug)]
pub enum AttributeError {
    /// Attribute not found by ID
    #[error("Attribute {0} not found")]
    NotFound(i32),

    /// Resource attribute not found by ID
    #[error("Resource attribute {0} not found")]
    ResourceAttrNotFound(i32),

    /// Template type not found by ID
    #[error("Template type {0} not found")]
    TypeNotFound(i32),

    /// Attribute group not found by ID
    #[error("Attribute group {0} not found")]
    GroupNotFound(i32),

    /// Referenced resource does not exist
    #[error("{resource_type} {resource_id} not found")]
    ResourceNotFound {
        resource_type: String,
        resource_id: i32,
    },

    /// Attribute already attached to the resource
    #[error("Attribute {attr_id} is already attached to {resource_type} {resource_id}")]
    Duplicate {
        attr_id: i32,
        resource_type: String,
        resource_id: i32,
    },

    /// Attribute group name already used within the project
    #[error("Attribute group '{name}' already exists in project {project_id}")]
    GroupNameConflict { project_id: i32, name: String },

    /// Exclusivity rule rejected a group membership
    #[error(
        "Attribute {attr_id} cannot join group {group_id} in network {network_id}: {reason}"
    )]
    ExclusiveGroup {
        attr_id: i32,
        group_id: i32,
        network_id: i32,
        reason: String,
    },

    /// Mapping endpoints are invalid
    #[error("Invalid attribute mapping: {0}")]
    InvalidMapping(String),

    /// Unknown resource kind discriminator
    #[error("Unknown resource type '{0}'")]
    UnknownResourceType(String),

    /// Permission denied
    #[error(transparent)]
    Permission(#[from] PermissionError),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}
