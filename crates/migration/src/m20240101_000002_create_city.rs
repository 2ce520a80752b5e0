//! Create `cities` table with FK to `states`.
//!
//! Deleting a state removes its cities.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Cities::Table)
                    .if_not_exists()
                    .col(string_len(Cities::Id, 60).primary_key())
                    .col(timestamp_with_time_zone(Cities::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Cities::UpdatedAt).not_null())
                    .col(string_len(Cities::StateId, 60).not_null())
                    .col(string(Cities::Name).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_city_state")
                            .from(Cities::Table, Cities::StateId)
                            .to(States::Table, States::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Cities::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Cities { Table, Id, CreatedAt, UpdatedAt, StateId, Name }

#[derive(DeriveIden)]
enum States { Table, Id }
