//! Dataset-related error types

use thiserror::Error;

use super::PermissionError;

/// Dataset-related errors
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Dataset not found by ID
    #[error("Dataset {0} not found")]
    NotFound(i32),

    /// Dataset is hidden from the requesting user
    #[error("Dataset {0} is hidden")]
    Hidden(i32),

    /// Value or metadata could not be validated or serialized
    #[error("Invalid dataset value: {0}")]
    InvalidValue(String),

    /// Unknown dataset type discriminator
    #[error("Unknown dataset type '{0}'")]
    UnknownType(String),

    /// External value store failed
    #[error("Value store error: {0}")]
    Storage(String),

    /// External value store holds no value for a referenced key
    #[error("Value store has no entry for key '{0}'")]
    MissingExternalValue(String),

    /// Permission denied
    #[error(transparent)]
    Permission(#[from] PermissionError),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}
