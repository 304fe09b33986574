use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Typed value container, shared by any number of resource-scenario bindings.
///
/// `hash` is a SHA-256 fingerprint of the canonical (value, metadata) pair.
/// When the value lives in the external store, `value` holds the store key
/// and the metadata carries a location marker.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "datasets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub data_type: String,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub value: String,
    pub unit_id: Option<i32>,
    pub hash: String,
    pub hidden: bool,
    #[sea_orm(column_type = "Text", default_value = "{}")]
    pub metadata: String, // JSON object stored as string
    pub created_by: Option<i32>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::resource_scenarios::Entity")]
    ResourceScenarios,
}

impl Related<super::resource_scenarios::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResourceScenarios.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
