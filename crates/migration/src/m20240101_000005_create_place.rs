//! Create `places` table with FKs to `cities` and `users`.
//!
//! A place disappears with either its city or its owner.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Places::Table)
                    .if_not_exists()
                    .col(string_len(Places::Id, 60).primary_key())
                    .col(timestamp_with_time_zone(Places::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Places::UpdatedAt).not_null())
                    .col(string_len(Places::CityId, 60).not_null())
                    .col(string_len(Places::UserId, 60).not_null())
                    .col(string(Places::Name).not_null())
                    .col(text_null(Places::Description))
                    .col(integer(Places::NumberRooms).default(0))
                    .col(integer(Places::NumberBathrooms).default(0))
                    .col(integer(Places::MaxGuest).default(0))
                    .col(integer(Places::PriceByNight).default(0))
                    .col(double_null(Places::Latitude))
                    .col(double_null(Places::Longitude))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_place_city")
                            .from(Places::Table, Places::CityId)
                            .to(Cities::Table, Cities::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_place_user")
                            .from(Places::Table, Places::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Places::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Places {
    Table,
    Id,
    CreatedAt,
    UpdatedAt,
    CityId,
    UserId,
    Name,
    Description,
    NumberRooms,
    NumberBathrooms,
    MaxGuest,
    PriceByNight,
    Latitude,
    Longitude,
}

#[derive(DeriveIden)]
enum Cities { Table, Id }

#[derive(DeriveIden)]
enum Users { Table, Id }
