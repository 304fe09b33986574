use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Global attribute definition, unique by (name, dimension). Immutable once
/// any resource references it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attributes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub dimension_id: Option<i32>,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::resource_attrs::Entity")]
    ResourceAttrs,
}

impl Related<super::resource_attrs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResourceAttrs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
