use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create templates table
        manager
            .create_table(
                Table::create()
                    .table(Templates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Templates::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Templates::Name).string().not_null())
                    .col(ColumnDef::new(Templates::Description).string())
                    .col(ColumnDef::new(Templates::ParentId).integer())
                    .col(ColumnDef::new(Templates::Status).string().not_null().default("A"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_templates_parent_id")
                            .from(Templates::Table, Templates::ParentId)
                            .to(Templates::Table, Templates::Id),
                    )
                    .index(
                        Index::create()
                            .name("idx_templates_name")
                            .table(Templates::Table)
                            .col(Templates::Name)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create template_types table
        manager
            .create_table(
                Table::create()
                    .table(TemplateTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TemplateTypes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TemplateTypes::TemplateId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TemplateTypes::Name).string().not_null())
                    .col(
                        ColumnDef::new(TemplateTypes::ResourceType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TemplateTypes::ParentId).integer())
                    .col(
                        ColumnDef::new(TemplateTypes::Status)
                            .string()
                            .not_null()
                            .default("A"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_template_types_template_id")
                            .from(TemplateTypes::Table, TemplateTypes::TemplateId)
                            .to(Templates::Table, Templates::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_template_types_parent_id")
                            .from(TemplateTypes::Table, TemplateTypes::ParentId)
                            .to(TemplateTypes::Table, TemplateTypes::Id),
                    )
                    .index(
                        Index::create()
                            .name("idx_template_types_template_name")
                            .table(TemplateTypes::Table)
                            .col(TemplateTypes::TemplateId)
                            .col(TemplateTypes::Name)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create type_attrs table
        manager
            .create_table(
                Table::create()
                    .table(TypeAttrs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TypeAttrs::TypeId).integer().not_null())
                    .col(ColumnDef::new(TypeAttrs::AttrId).integer().not_null())
                    .col(
                        ColumnDef::new(TypeAttrs::AttrIsVar)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(TypeAttrs::DataType).string())
                    .col(ColumnDef::new(TypeAttrs::UnitId).integer())
                    .primary_key(
                        Index::create()
                            .col(TypeAttrs::TypeId)
                            .col(TypeAttrs::AttrId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_type_attrs_type_id")
                            .from(TypeAttrs::Table, TypeAttrs::TypeId)
                            .to(TemplateTypes::Table, TemplateTypes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_type_attrs_attr_id")
                            .from(TypeAttrs::Table, TypeAttrs::AttrId)
                            .to(Attributes::Table, Attributes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TypeAttrs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TemplateTypes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Templates::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum Templates {
    Table,
    Id,
    Name,
    Description,
    ParentId,
    Status,
}

#[derive(Iden)]
enum TemplateTypes {
    Table,
    Id,
    TemplateId,
    Name,
    ResourceType,
    ParentId,
    Status,
}

#[derive(Iden)]
enum TypeAttrs {
    Table,
    TypeId,
    AttrId,
    AttrIsVar,
    DataType,
    UnitId,
}

#[derive(Iden)]
enum Attributes {
    Table,
    Id,
}
