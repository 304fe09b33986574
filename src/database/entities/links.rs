use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "links")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub network_id: i32,
    pub node_a_id: i32,
    pub node_b_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
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
        belongs_to = "super::nodes::Entity",
        from = "Column::NodeAId",
        to = "super::nodes::Column::Id"
    )]
    NodeA,
    #[sea_orm(
        belongs_to = "super::nodes::Entity",
        from = "Column::NodeBId",
        to = "super::nodes::Column::Id"
    )]
    NodeB,
}

impl Related<super::networks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Network.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
