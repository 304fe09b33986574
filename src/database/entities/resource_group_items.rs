use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Membership of a node, link, or subgroup inside a resource group, scoped to
/// one scenario. The same node can belong to a group in one scenario and not
/// another.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "resource_group_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub group_id: i32,
    pub scenario_id: i32,
    pub ref_key: String,
    pub node_id: Option<i32>,
    pub link_id: Option<i32>,
    pub subgroup_id: Option<i32>,
}

impl Model {
    /// Identity tuple used by scenario comparison.
    pub fn membership_key(&self) -> (i32, String, Option<i32>, Option<i32>, Option<i32>) {
        (
            self.group_id,
            self.ref_key.clone(),
            self.node_id,
            self.link_id,
            self.subgroup_id,
        )
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::resource_groups::Entity",
        from = "Column::GroupId",
        to = "super::resource_groups::Column::Id"
    )]
    Group,
    #[sea_orm(
        belongs_to = "super::scenarios::Entity",
        from = "Column::ScenarioId",
        to = "super::scenarios::Column::Id"
    )]
    Scenario,
}

impl Related<super::resource_groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::scenarios::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Scenario.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
