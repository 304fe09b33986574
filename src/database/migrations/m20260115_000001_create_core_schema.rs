use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create projects table
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Projects::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Projects::Name).string().not_null())
                    .col(ColumnDef::new(Projects::Description).string())
                    .col(ColumnDef::new(Projects::Status).string().not_null().default("A"))
                    .col(ColumnDef::new(Projects::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Projects::UpdatedAt).timestamp().not_null())
                    .index(
                        Index::create()
                            .name("idx_projects_name")
                            .table(Projects::Table)
                            .col(Projects::Name)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create networks table
        manager
            .create_table(
                Table::create()
                    .table(Networks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Networks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Networks::ProjectId).integer().not_null())
                    .col(ColumnDef::new(Networks::Name).string().not_null())
                    .col(ColumnDef::new(Networks::Description).string())
                    .col(ColumnDef::new(Networks::Status).string().not_null().default("A"))
                    .col(ColumnDef::new(Networks::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Networks::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_networks_project_id")
                            .from(Networks::Table, Networks::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .name("idx_networks_project_name")
                            .table(Networks::Table)
                            .col(Networks::ProjectId)
                            .col(Networks::Name)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create nodes table
        manager
            .create_table(
                Table::create()
                    .table(Nodes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Nodes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Nodes::NetworkId).integer().not_null())
                    .col(ColumnDef::new(Nodes::Name).string().not_null())
                    .col(ColumnDef::new(Nodes::Description).string())
                    .col(ColumnDef::new(Nodes::X).double())
                    .col(ColumnDef::new(Nodes::Y).double())
                    .col(ColumnDef::new(Nodes::Status).string().not_null().default("A"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_nodes_network_id")
                            .from(Nodes::Table, Nodes::NetworkId)
                            .to(Networks::Table, Networks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .name("idx_nodes_network_name")
                            .table(Nodes::Table)
                            .col(Nodes::NetworkId)
                            .col(Nodes::Name)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create links table
        manager
            .create_table(
                Table::create()
                    .table(Links::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Links::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Links::NetworkId).integer().not_null())
                    .col(ColumnDef::new(Links::NodeAId).integer().not_null())
                    .col(ColumnDef::new(Links::NodeBId).integer().not_null())
                    .col(ColumnDef::new(Links::Name).string().not_null())
                    .col(ColumnDef::new(Links::Description).string())
                    .col(ColumnDef::new(Links::Status).string().not_null().default("A"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_links_network_id")
                            .from(Links::Table, Links::NetworkId)
                            .to(Networks::Table, Networks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_links_node_a_id")
                            .from(Links::Table, Links::NodeAId)
                            .to(Nodes::Table, Nodes::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_links_node_b_id")
                            .from(Links::Table, Links::NodeBId)
                            .to(Nodes::Table, Nodes::Id),
                    )
                    .index(
                        Index::create()
                            .name("idx_links_network_name")
                            .table(Links::Table)
                            .col(Links::NetworkId)
                            .col(Links::Name)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create resource_groups table
        manager
            .create_table(
                Table::create()
                    .table(ResourceGroups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ResourceGroups::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ResourceGroups::NetworkId).integer().not_null())
                    .col(ColumnDef::new(ResourceGroups::Name).string().not_null())
                    .col(ColumnDef::new(ResourceGroups::Description).string())
                    .col(
                        ColumnDef::new(ResourceGroups::Status)
                            .string()
                            .not_null()
                            .default("A"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_resource_groups_network_id")
                            .from(ResourceGroups::Table, ResourceGroups::NetworkId)
                            .to(Networks::Table, Networks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .name("idx_resource_groups_network_name")
                            .table(ResourceGroups::Table)
                            .col(ResourceGroups::NetworkId)
                            .col(ResourceGroups::Name)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create attributes table
        manager
            .create_table(
                Table::create()
                    .table(Attributes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Attributes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Attributes::Name).string().not_null())
                    .col(ColumnDef::new(Attributes::DimensionId).integer())
                    .col(ColumnDef::new(Attributes::Description).string())
                    .index(
                        Index::create()
                            .name("idx_attributes_name_dimension")
                            .table(Attributes::Table)
                            .col(Attributes::Name)
                            .col(Attributes::DimensionId)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create resource_attrs table
        manager
            .create_table(
                Table::create()
                    .table(ResourceAttrs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ResourceAttrs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ResourceAttrs::AttrId).integer().not_null())
                    .col(ColumnDef::new(ResourceAttrs::RefKey).string().not_null())
                    .col(ColumnDef::new(ResourceAttrs::ProjectId).integer())
                    .col(ColumnDef::new(ResourceAttrs::NetworkId).integer())
                    .col(ColumnDef::new(ResourceAttrs::NodeId).integer())
                    .col(ColumnDef::new(ResourceAttrs::LinkId).integer())
                    .col(ColumnDef::new(ResourceAttrs::GroupId).integer())
                    .col(
                        ColumnDef::new(ResourceAttrs::AttrIsVar)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_resource_attrs_attr_id")
                            .from(ResourceAttrs::Table, ResourceAttrs::AttrId)
                            .to(Attributes::Table, Attributes::Id),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_resource_attrs_attr_id")
                    .table(ResourceAttrs::Table)
                    .col(ResourceAttrs::AttrId)
                    .to_owned(),
            )
            .await?;

        // Create datasets table
        manager
            .create_table(
                Table::create()
                    .table(Datasets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Datasets::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Datasets::DataType).string().not_null())
                    .col(ColumnDef::new(Datasets::Name).string().not_null())
                    .col(ColumnDef::new(Datasets::Value).text().not_null())
                    .col(ColumnDef::new(Datasets::UnitId).integer())
                    .col(ColumnDef::new(Datasets::Hash).string().not_null())
                    .col(
                        ColumnDef::new(Datasets::Hidden)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Datasets::Metadata)
                            .text()
                            .not_null()
                            .default("{}"),
                    )
                    .col(ColumnDef::new(Datasets::CreatedBy).integer())
                    .col(ColumnDef::new(Datasets::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Datasets::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_datasets_hash")
                    .table(Datasets::Table)
                    .col(Datasets::Hash)
                    .to_owned(),
            )
            .await?;

        // Create scenarios table
        manager
            .create_table(
                Table::create()
                    .table(Scenarios::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Scenarios::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Scenarios::NetworkId).integer().not_null())
                    .col(ColumnDef::new(Scenarios::Name).string().not_null())
                    .col(ColumnDef::new(Scenarios::Description).string())
                    .col(ColumnDef::new(Scenarios::ParentId).integer())
                    .col(
                        ColumnDef::new(Scenarios::Locked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Scenarios::Status).string().not_null().default("A"))
                    .col(ColumnDef::new(Scenarios::StartTime).string())
                    .col(ColumnDef::new(Scenarios::EndTime).string())
                    .col(ColumnDef::new(Scenarios::TimeStep).string())
                    .col(ColumnDef::new(Scenarios::CreatedBy).integer())
                    .col(ColumnDef::new(Scenarios::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Scenarios::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scenarios_network_id")
                            .from(Scenarios::Table, Scenarios::NetworkId)
                            .to(Networks::Table, Networks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scenarios_parent_id")
                            .from(Scenarios::Table, Scenarios::ParentId)
                            .to(Scenarios::Table, Scenarios::Id),
                    )
                    .index(
                        Index::create()
                            .name("idx_scenarios_network_name")
                            .table(Scenarios::Table)
                            .col(Scenarios::NetworkId)
                            .col(Scenarios::Name)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create resource_scenarios table
        manager
            .create_table(
                Table::create()
                    .table(ResourceScenarios::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ResourceScenarios::ScenarioId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResourceScenarios::ResourceAttrId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResourceScenarios::DatasetId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ResourceScenarios::Source).string())
                    .primary_key(
                        Index::create()
                            .col(ResourceScenarios::ScenarioId)
                            .col(ResourceScenarios::ResourceAttrId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_resource_scenarios_scenario_id")
                            .from(ResourceScenarios::Table, ResourceScenarios::ScenarioId)
                            .to(Scenarios::Table, Scenarios::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_resource_scenarios_resource_attr_id")
                            .from(ResourceScenarios::Table, ResourceScenarios::ResourceAttrId)
                            .to(ResourceAttrs::Table, ResourceAttrs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_resource_scenarios_dataset_id")
                            .from(ResourceScenarios::Table, ResourceScenarios::DatasetId)
                            .to(Datasets::Table, Datasets::Id),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_resource_scenarios_dataset_id")
                    .table(ResourceScenarios::Table)
                    .col(ResourceScenarios::DatasetId)
                    .to_owned(),
            )
            .await?;

        // Create resource_group_items table
        manager
            .create_table(
                Table::create()
                    .table(ResourceGroupItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ResourceGroupItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ResourceGroupItems::GroupId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResourceGroupItems::ScenarioId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ResourceGroupItems::RefKey).string().not_null())
                    .col(ColumnDef::new(ResourceGroupItems::NodeId).integer())
                    .col(ColumnDef::new(ResourceGroupItems::LinkId).integer())
                    .col(ColumnDef::new(ResourceGroupItems::SubgroupId).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_resource_group_items_group_id")
                            .from(ResourceGroupItems::Table, ResourceGroupItems::GroupId)
                            .to(ResourceGroups::Table, ResourceGroups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_resource_group_items_scenario_id")
                            .from(ResourceGroupItems::Table, ResourceGroupItems::ScenarioId)
                            .to(Scenarios::Table, Scenarios::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_resource_group_items_scenario_id")
                    .table(ResourceGroupItems::Table)
                    .col(ResourceGroupItems::ScenarioId)
                    .to_owned(),
            )
            .await?;

        // Create resource_attr_maps table
        manager
            .create_table(
                Table::create()
                    .table(ResourceAttrMaps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ResourceAttrMaps::ResourceAttrAId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResourceAttrMaps::ResourceAttrBId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResourceAttrMaps::NetworkAId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ResourceAttrMaps::NetworkBId)
                            .integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(ResourceAttrMaps::ResourceAttrAId)
                            .col(ResourceAttrMaps::ResourceAttrBId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_resource_attr_maps_a")
                            .from(ResourceAttrMaps::Table, ResourceAttrMaps::ResourceAttrAId)
                            .to(ResourceAttrs::Table, ResourceAttrs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_resource_attr_maps_b")
                            .from(ResourceAttrMaps::Table, ResourceAttrMaps::ResourceAttrBId)
                            .to(ResourceAttrs::Table, ResourceAttrs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create attr_groups table
        manager
            .create_table(
                Table::create()
                    .table(AttrGroups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AttrGroups::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AttrGroups::ProjectId).integer().not_null())
                    .col(ColumnDef::new(AttrGroups::Name).string().not_null())
                    .col(ColumnDef::new(AttrGroups::Description).string())
                    .col(ColumnDef::new(AttrGroups::Layout).text())
                    .col(
                        ColumnDef::new(AttrGroups::Exclusive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attr_groups_project_id")
                            .from(AttrGroups::Table, AttrGroups::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .name("idx_attr_groups_project_name")
                            .table(AttrGroups::Table)
                            .col(AttrGroups::ProjectId)
                            .col(AttrGroups::Name)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create attr_group_items table
        manager
            .create_table(
                Table::create()
                    .table(AttrGroupItems::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AttrGroupItems::GroupId).integer().not_null())
                    .col(ColumnDef::new(AttrGroupItems::AttrId).integer().not_null())
                    .col(
                        ColumnDef::new(AttrGroupItems::NetworkId)
                            .integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(AttrGroupItems::GroupId)
                            .col(AttrGroupItems::AttrId)
                            .col(AttrGroupItems::NetworkId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attr_group_items_group_id")
                            .from(AttrGroupItems::Table, AttrGroupItems::GroupId)
                            .to(AttrGroups::Table, AttrGroups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attr_group_items_attr_id")
                            .from(AttrGroupItems::Table, AttrGroupItems::AttrId)
                            .to(Attributes::Table, Attributes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_attr_group_items_network_attr")
                    .table(AttrGroupItems::Table)
                    .col(AttrGroupItems::NetworkId)
                    .col(AttrGroupItems::AttrId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AttrGroupItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AttrGroups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ResourceAttrMaps::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ResourceGroupItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ResourceScenarios::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Scenarios::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Datasets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ResourceAttrs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Attributes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ResourceGroups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Links::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Nodes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Networks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum Projects {
    Table,
    Id,
    Name,
    Description,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Networks {
    Table,
    Id,
    ProjectId,
    Name,
    Description,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Nodes {
    Table,
    Id,
    NetworkId,
    Name,
    Description,
    X,
    Y,
    Status,
}

#[derive(Iden)]
enum Links {
    Table,
    Id,
    NetworkId,
    NodeAId,
    NodeBId,
    Name,
    Description,
    Status,
}

#[derive(Iden)]
enum ResourceGroups {
    Table,
    Id,
    NetworkId,
    Name,
    Description,
    Status,
}

#[derive(Iden)]
enum Attributes {
    Table,
    Id,
    Name,
    DimensionId,
    Description,
}

#[derive(Iden)]
enum ResourceAttrs {
    Table,
    Id,
    AttrId,
    RefKey,
    ProjectId,
    NetworkId,
    NodeId,
    LinkId,
    GroupId,
    AttrIsVar,
}

#[derive(Iden)]
enum Datasets {
    Table,
    Id,
    DataType,
    Name,
    Value,
    UnitId,
    Hash,
    Hidden,
    Metadata,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Scenarios {
    Table,
    Id,
    NetworkId,
    Name,
    Description,
    ParentId,
    Locked,
    Status,
    StartTime,
    EndTime,
    TimeStep,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ResourceScenarios {
    Table,
    ScenarioId,
    ResourceAttrId,
    DatasetId,
    Source,
}

#[derive(Iden)]
enum ResourceGroupItems {
    Table,
    Id,
    GroupId,
    ScenarioId,
    RefKey,
    NodeId,
    LinkId,
    SubgroupId,
}

#[derive(Iden)]
enum ResourceAttrMaps {
    Table,
    ResourceAttrAId,
    ResourceAttrBId,
    NetworkAId,
    NetworkBId,
}

#[derive(Iden)]
enum AttrGroups {
    Table,
    Id,
    ProjectId,
    Name,
    Description,
    Layout,
    Exclusive,
}

#[derive(Iden)]
enum AttrGroupItems {
    Table,
    GroupId,
    AttrId,
    NetworkId,
}
