use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Membership of an attribute in an attribute group, scoped to one network.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attr_group_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub group_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub attr_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub network_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::attr_groups::Entity",
        from = "Column::GroupId",
        to = "super::attr_groups::Column::Id"
    )]
    Group,
    #[sea_orm(
        belongs_to = "super::attributes::Entity",
        from = "Column::AttrId",
        to = "super::attributes::Column::Id"
    )]
    Attribute,
    #[sea_orm(
        belongs_to = "super::networks::Entity",
        from = "Column::NetworkId",
        to = "super::networks::Column::Id"
    )]
    Network,
}

impl Related<super::attr_groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::attributes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attribute.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
