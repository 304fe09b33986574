use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attachment of a global attribute to exactly one resource.
///
/// `ref_key` names the resource kind and exactly one of the foreign keys is
/// non-null, matching it. `attr_is_var` marks simulation output as opposed to
/// input data.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "resource_attrs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub attr_id: i32,
    pub ref_key: String,
    pub project_id: Option<i32>,
    pub network_id: Option<i32>,
    pub node_id: Option<i32>,
    pub link_id: Option<i32>,
    pub group_id: Option<i32>,
    pub attr_is_var: bool,
}

impl Model {
    /// The id of whichever resource this attribute is attached to.
    pub fn resource_id(&self) -> Option<i32> {
        self.project_id
            .or(self.network_id)
            .or(self.node_id)
            .or(self.link_id)
            .or(self.group_id)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::attributes::Entity",
        from = "Column::AttrId",
        to = "super::attributes::Column::Id"
    )]
    Attribute,
    #[sea_orm(has_many = "super::resource_scenarios::Entity")]
    ResourceScenarios,
}

impl Related<super::attributes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attribute.def()
    }
}

impl Related<super::resource_scenarios::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResourceScenarios.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
