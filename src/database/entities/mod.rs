pub mod common_types;

pub mod attr_group_items;
pub mod attr_groups;
pub mod attributes;
pub mod datasets;
pub mod links;
pub mod networks;
pub mod nodes;
pub mod projects;
pub mod resource_attr_maps;
pub mod resource_attrs;
pub mod resource_group_items;
pub mod resource_groups;
pub mod resource_scenarios;
pub mod scenarios;
pub mod template_types;
pub mod templates;
pub mod type_attrs;
