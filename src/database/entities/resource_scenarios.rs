use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The binding of one resource attribute to one dataset within one scenario.
///
/// Unique per (scenario_id, resource_attr_id); changing a value means
/// repointing or updating this row's dataset_id.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "resource_scenarios")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub scenario_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub resource_attr_id: i32,
    pub dataset_id: i32,
    pub source: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::scenarios::Entity",
        from = "Column::ScenarioId",
        to = "super::scenarios::Column::Id"
    )]
    Scenario,
    #[sea_orm(
        belongs_to = "super::resource_attrs::Entity",
        from = "Column::ResourceAttrId",
        to = "super::resource_attrs::Column::Id"
    )]
    ResourceAttr,
    #[sea_orm(
        belongs_to = "super::datasets::Entity",
        from = "Column::DatasetId",
        to = "super::datasets::Column::Id"
    )]
    Dataset,
}

impl Related<super::scenarios::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Scenario.def()
    }
}

impl Related<super::resource_attrs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResourceAttr.def()
    }
}

impl Related<super::datasets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dataset.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
