use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users_table::Users;
use super::m20240101_000002_create_forums_table::Forums;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum ForumParticipants {
    Table,
    Id,
    ForumId,
    UserId,
    Initiator,
    Status,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ForumParticipants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ForumParticipants::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ForumParticipants::ForumId).integer().not_null())
                    .col(ColumnDef::new(ForumParticipants::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(ForumParticipants::Initiator)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    // 1 = accept, 2 = deny, 3 = waiting
                    .col(
                        ColumnDef::new(ForumParticipants::Status)
                            .small_integer()
                            .not_null()
                            .default(3),
                    )
                    .col(
                        ColumnDef::new(ForumParticipants::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_participants_forum_id")
                            .from(ForumParticipants::Table, ForumParticipants::ForumId)
                            .to(Forums::Table, Forums::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forum_participants_user_id")
                            .from(ForumParticipants::Table, ForumParticipants::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_forum_participants_forum_user")
                    .table(ForumParticipants::Table)
                    .col(ForumParticipants::ForumId)
                    .col(ForumParticipants::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_forum_participants_user_id")
                    .table(ForumParticipants::Table)
                    .col(ForumParticipants::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ForumParticipants::Table).to_owned())
            .await
    }
}
