use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A resource type within a template, declaring the attribute set a resource
/// of this type should carry. `parent_id` chains types across template
/// inheritance; a child type inherits its parent's type attrs unless it
/// redeclares them.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "template_types")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub template_id: i32,
    pub name: String,
    pub resource_type: String,
    pub parent_id: Option<i32>,
    pub status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::templates::Entity",
        from = "Column::TemplateId",
        to = "super::templates::Column::Id"
    )]
    Template,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id"
    )]
    Parent,
    #[sea_orm(has_many = "super::type_attrs::Entity")]
    TypeAttrs,
}

impl Related<super::templates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Template.def()
    }
}

impl Related<super::type_attrs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TypeAttrs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
