use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Declaration that resources of a template type carry a given attribute.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "type_attrs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub type_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub attr_id: i32,
    pub attr_is_var: bool,
    pub data_type: Option<String>,
    pub unit_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::template_types::Entity",
        from = "Column::TypeId",
        to = "super::template_types::Column::Id"
    )]
    TemplateType,
    #[sea_orm(
        belongs_to = "super::attributes::Entity",
        from = "Column::AttrId",
        to = "super::attributes::Column::Id"
    )]
    Attribute,
}

impl Related<super::template_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TemplateType.def()
    }
}

impl Related<super::attributes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attribute.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
