use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_suppliers_table::Migration),
            Box::new(m20240301_000002_create_materials_table::Migration),
            Box::new(m20240301_000003_create_usage_log_entries_table::Migration),
            Box::new(m20240301_000004_create_sales_tables::Migration),
            Box::new(m20240301_000005_create_reorder_requests_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_suppliers_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_suppliers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(ColumnDef::new(Suppliers::Contact).string().null())
                        .col(ColumnDef::new(Suppliers::Address).string().null())
                        .col(ColumnDef::new(Suppliers::CreatedAt).timestamp_with_time_zone().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_suppliers_name")
                        .table(Suppliers::Table)
                        .col(Suppliers::Name)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Suppliers {
        Table,
        Id,
        Name,
        Contact,
        Address,
        CreatedAt,
    }
}

mod m20240301_000002_create_materials_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_materials_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Materials::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Materials::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Materials::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Materials::Unit)
                                .string()
                                .not_null()
                                .default("pcs"),
                        )
                        .col(
                            ColumnDef::new(Materials::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Materials::ReorderPoint)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Materials::PricePerUnit)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Materials::SupplierId).uuid().null())
                        .col(ColumnDef::new(Materials::CreatedAt).timestamp_with_time_zone().not_null())
                        .col(ColumnDef::new(Materials::UpdatedAt).timestamp_with_time_zone().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_materials_supplier_id")
                                .from(Materials::Table, Materials::SupplierId)
                                .to(
                                    super::m20240301_000001_create_suppliers_table::Suppliers::Table,
                                    super::m20240301_000001_create_suppliers_table::Suppliers::Id,
                                )
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_materials_supplier_id")
                        .table(Materials::Table)
                        .col(Materials::SupplierId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Materials::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Materials {
        Table,
        Id,
        Name,
        Unit,
        Quantity,
        ReorderPoint,
        PricePerUnit,
        SupplierId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000003_create_usage_log_entries_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_usage_log_entries_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(UsageLogEntries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(UsageLogEntries::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(UsageLogEntries::MaterialId).uuid().not_null())
                        .col(
                            ColumnDef::new(UsageLogEntries::QuantityUsed)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UsageLogEntries::RemainingQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UsageLogEntries::RecordedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_usage_log_entries_material_id")
                                .from(UsageLogEntries::Table, UsageLogEntries::MaterialId)
                                .to(
                                    super::m20240301_000002_create_materials_table::Materials::Table,
                                    super::m20240301_000002_create_materials_table::Materials::Id,
                                )
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            // The forecaster reads a material's ledger ordered by time
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_usage_log_entries_material_recorded")
                        .table(UsageLogEntries::Table)
                        .col(UsageLogEntries::MaterialId)
                        .col(UsageLogEntries::RecordedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(UsageLogEntries::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum UsageLogEntries {
        Table,
        Id,
        MaterialId,
        QuantityUsed,
        RemainingQuantity,
        RecordedAt,
    }
}

mod m20240301_000004_create_sales_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_sales_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Sales::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Sales::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Sales::SaleDate).timestamp_with_time_zone().not_null())
                        .col(
                            ColumnDef::new(Sales::Total)
                                .decimal_len(19, 4)
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SaleItems::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(SaleItems::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(SaleItems::SaleId).uuid().not_null())
                        .col(ColumnDef::new(SaleItems::MaterialId).uuid().not_null())
                        .col(ColumnDef::new(SaleItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(SaleItems::UnitPrice)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sale_items_sale_id")
                                .from(SaleItems::Table, SaleItems::SaleId)
                                .to(Sales::Table, Sales::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sale_items_material_id")
                                .from(SaleItems::Table, SaleItems::MaterialId)
                                .to(
                                    super::m20240301_000002_create_materials_table::Materials::Table,
                                    super::m20240301_000002_create_materials_table::Materials::Id,
                                )
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sale_items_sale_id")
                        .table(SaleItems::Table)
                        .col(SaleItems::SaleId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sale_items_material_id")
                        .table(SaleItems::Table)
                        .col(SaleItems::MaterialId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SaleItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Sales::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Sales {
        Table,
        Id,
        SaleDate,
        Total,
    }

    #[derive(Iden)]
    pub enum SaleItems {
        Table,
        Id,
        SaleId,
        MaterialId,
        Quantity,
        UnitPrice,
    }
}

mod m20240301_000005_create_reorder_requests_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_reorder_requests_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ReorderRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ReorderRequests::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ReorderRequests::MaterialId).uuid().not_null())
                        .col(ColumnDef::new(ReorderRequests::SupplierId).uuid().null())
                        .col(
                            ColumnDef::new(ReorderRequests::RequestedQty)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReorderRequests::Status)
                                .string_len(20)
                                .not_null()
                                .default("pending"),
                        )
                        .col(
                            ColumnDef::new(ReorderRequests::RequestedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_reorder_requests_material_id")
                                .from(ReorderRequests::Table, ReorderRequests::MaterialId)
                                .to(
                                    super::m20240301_000002_create_materials_table::Materials::Table,
                                    super::m20240301_000002_create_materials_table::Materials::Id,
                                )
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_reorder_requests_supplier_id")
                                .from(ReorderRequests::Table, ReorderRequests::SupplierId)
                                .to(
                                    super::m20240301_000001_create_suppliers_table::Suppliers::Table,
                                    super::m20240301_000001_create_suppliers_table::Suppliers::Id,
                                )
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_reorder_requests_material_id")
                        .table(ReorderRequests::Table)
                        .col(ReorderRequests::MaterialId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ReorderRequests::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum ReorderRequests {
        Table,
        Id,
        MaterialId,
        SupplierId,
        RequestedQty,
        Status,
        RequestedAt,
    }
}
