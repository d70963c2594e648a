use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    Tenant,
    ClientName,
    Artist,
    Service,
    PaymentMethod,
    ValueCentavos,
    Obs,
    CreatedAt,
    UserId,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::Tenant).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::ClientName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Artist).string().not_null())
                    .col(ColumnDef::new(Transactions::Service).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::PaymentMethod)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::ValueCentavos)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Obs).string())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::UserId).string().not_null())
                    .to_owned(),
            )
            .await?;

        // The subscription always reads the full collection ordered by
        // created_at within one tenant.
        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-tenant-created_at")
                    .table(Transactions::Table)
                    .col(Transactions::Tenant)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await
    }
}
