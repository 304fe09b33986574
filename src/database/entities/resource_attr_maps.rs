use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cross-network equivalence between two resource attributes.
///
/// The pair is undirected; the service layer treats (a, b) and (b, a) as the
/// same mapping on lookup and deletion.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "resource_attr_maps")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub resource_attr_a_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub resource_attr_b_id: i32,
    pub network_a_id: i32,
    pub network_b_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::resource_attrs::Entity",
        from = "Column::ResourceAttrAId",
        to = "super::resource_attrs::Column::Id"
    )]
    ResourceAttrA,
    #[sea_orm(
        belongs_to = "super::resource_attrs::Entity",
        from = "Column::ResourceAttrBId",
        to = "super::resource_attrs::Column::Id"
    )]
    ResourceAttrB,
}

impl ActiveModelBehavior for ActiveModel {}
