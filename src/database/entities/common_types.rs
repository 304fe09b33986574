//! Discriminator values shared across entities
//!
//! These are stored as plain strings in the database; the enums keep the
//! service layer honest about the accepted values.

use serde::{Deserialize, Serialize};

use crate::errors::{AttributeError, DatasetError};

/// Which kind of resource a `resource_attrs` or `resource_group_items` row
/// refers to. Stored in the `ref_key` column.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum ResourceKind {
    Project,
    Network,
    Node,
    Link,
    Group,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Project => "PROJECT",
            ResourceKind::Network => "NETWORK",
            ResourceKind::Node => "NODE",
            ResourceKind::Link => "LINK",
            ResourceKind::Group => "GROUP",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AttributeError> {
        match value {
            "PROJECT" => Ok(ResourceKind::Project),
            "NETWORK" => Ok(ResourceKind::Network),
            "NODE" => Ok(ResourceKind::Node),
            "LINK" => Ok(ResourceKind::Link),
            "GROUP" => Ok(ResourceKind::Group),
            other => Err(AttributeError::UnknownResourceType(other.to_string())),
        }
    }
}

/// Value shape of a dataset. Stored in the `data_type` column.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum DataType {
    Scalar,
    Array,
    Timeseries,
    Descriptor,
    Dataframe,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Scalar => "scalar",
            DataType::Array => "array",
            DataType::Timeseries => "timeseries",
            DataType::Descriptor => "descriptor",
            DataType::Dataframe => "dataframe",
        }
    }

    pub fn parse(value: &str) -> Result<Self, DatasetError> {
        match value {
            "scalar" => Ok(DataType::Scalar),
            "array" => Ok(DataType::Array),
            "timeseries" => Ok(DataType::Timeseries),
            "descriptor" => Ok(DataType::Descriptor),
            "dataframe" => Ok(DataType::Dataframe),
            other => Err(DatasetError::UnknownType(other.to_string())),
        }
    }
}

/// Row status flag: active or soft-deleted.
pub const STATUS_ACTIVE: &str = "A";
pub const STATUS_DELETED: &str = "X";
