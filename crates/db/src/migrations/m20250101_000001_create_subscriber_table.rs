//! Create subscriber table for outbound webhooks.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create subscriber table
        manager
            .create_table(
                Table::create()
                    .table(Subscriber::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Subscriber::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Subscriber::Name).string().not_null())
                    .col(ColumnDef::new(Subscriber::Url).text().not_null())
                    .col(ColumnDef::new(Subscriber::Secret).string().not_null())
                    .col(
                        ColumnDef::new(Subscriber::Subscriptions)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Subscriber::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Subscriber::LastDeliveredAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Subscriber::FailureCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Subscriber::LastError).text().null())
                    .col(
                        ColumnDef::new(Subscriber::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Subscriber::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create index on active
        manager
            .create_index(
                Index::create()
                    .name("idx_subscriber_active")
                    .table(Subscriber::Table)
                    .col(Subscriber::Active)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Subscriber::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Subscriber {
    Table,
    Id,
    Name,
    Url,
    Secret,
    Subscriptions,
    Active,
    LastDeliveredAt,
    FailureCount,
    LastError,
    CreatedAt,
    UpdatedAt,
}
