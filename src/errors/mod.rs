//! Domain-specific error types for hydronet-core
//!
//! Each subsystem reports failures through its own structured error type so
//! callers can distinguish missing rows, permission denials, locked scenarios,
//! and validation problems without string matching.
//!
//! - **ScenarioError**: scenario lifecycle, cloning, merging, and value
//!   assignment
//! - **DatasetError**: dataset storage, hashing, and external value offload
//! - **AttributeError**: attribute definitions, resource attachment, mapping,
//!   and group exclusivity
//! - **PermissionError**: denials from the injected permission checker

pub mod attribute;
pub mod dataset;
pub mod permission;
pub mod scenario;

pub use attribute::AttributeError;
pub use dataset::DatasetError;
pub use permission::PermissionError;
pub use scenario::ScenarioError;

/// Result type alias for scenario operations
pub type ScenarioResult<T> = Result<T, ScenarioError>;

/// Result type alias for dataset operations
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Result type alias for attribute operations
pub type AttributeResult<T> = Result<T, AttributeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_result_alias() {
        let result: ScenarioResult<i32> = Err(ScenarioError::NotFound(42));
        assert!(result.is_err());
    }

    #[test]
    fn test_dataset_result_alias() {
        let result: DatasetResult<()> = Err(DatasetError::NotFound(1));
        assert!(result.is_err());
    }

    #[test]
    fn test_attribute_result_alias() {
        let result: AttributeResult<()> = Err(AttributeError::NotFound(7));
        assert!(result.is_err());
    }
}
