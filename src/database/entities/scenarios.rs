use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A named set of resource-attribute values within one network.
///
/// `parent_id` forms a tree; a child inherits bindings it does not set itself
/// at read time. `locked` is a cooperative application-level lock, not a
/// database lock.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "scenarios")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub network_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i32>,
    pub locked: bool,
    pub status: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub time_step: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::networks::Entity",
        from = "Column::NetworkId",
        to = "super::networks::Column::Id"
    )]
    Network,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id"
    )]
    Parent,
    #[sea_orm(has_many = "super::resource_scenarios::Entity")]
    ResourceScenarios,
    #[sea_orm(has_many = "super::resource_group_items::Entity")]
    ResourceGroupItems,
}

impl Related<super::networks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Network.def()
    }
}

impl Related<super::resource_scenarios::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResourceScenarios.def()
    }
}

impl Related<super::resource_group_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResourceGroupItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
