//! Create `close_friend` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CloseFriend::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CloseFriend::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CloseFriend::OwnerId).big_integer().not_null())
                    .col(ColumnDef::new(CloseFriend::FriendId).big_integer().not_null())
                    .col(
                        ColumnDef::new(CloseFriend::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_close_friend_owner")
                            .from(CloseFriend::Table, CloseFriend::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_close_friend_friend")
                            .from(CloseFriend::Table, CloseFriend::FriendId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (owner_id, friend_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_close_friend_owner_friend")
                    .table(CloseFriend::Table)
                    .col(CloseFriend::OwnerId)
                    .col(CloseFriend::FriendId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: friend_id (block cascade deletes by friend)
        manager
            .create_index(
                Index::create()
                    .name("idx_close_friend_friend_id")
                    .table(CloseFriend::Table)
                    .col(CloseFriend::FriendId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CloseFriend::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CloseFriend {
    Table,
    Id,
    OwnerId,
    FriendId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
