use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
pub(super) enum Forums {
    Table,
    Id,
    Topic,
    TopicLowercase,
    Description,
    Status,
    ClosedAt,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Forums::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Forums::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Forums::Topic).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Forums::TopicLowercase)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Forums::Description).text().null())
                    // 1 = open, 2 = closed
                    .col(
                        ColumnDef::new(Forums::Status)
                            .small_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Forums::ClosedAt).timestamp().null())
                    .col(
                        ColumnDef::new(Forums::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Forums::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_forums_topic_lowercase")
                    .table(Forums::Table)
                    .col(Forums::TopicLowercase)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Forums::Table).to_owned())
            .await
    }
}
