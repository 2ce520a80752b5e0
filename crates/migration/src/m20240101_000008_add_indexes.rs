use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Cities: lookups by state
        manager
            .create_index(
                Index::create()
                    .name("idx_city_state")
                    .table(Cities::Table)
                    .col(Cities::StateId)
                    .to_owned(),
            )
            .await?;

        // Places: lookups by city and by owner
        manager
            .create_index(
                Index::create()
                    .name("idx_place_city")
                    .table(Places::Table)
                    .col(Places::CityId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_place_user")
                    .table(Places::Table)
                    .col(Places::UserId)
                    .to_owned(),
            )
            .await?;

        // Reviews: lookups by place
        manager
            .create_index(
                Index::create()
                    .name("idx_review_place")
                    .table(Reviews::Table)
                    .col(Reviews::PlaceId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_city_state").table(Cities::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_place_city").table(Places::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_place_user").table(Places::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_review_place").table(Reviews::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Cities { Table, StateId }

#[derive(DeriveIden)]
enum Places { Table, CityId, UserId }

#[derive(DeriveIden)]
enum Reviews { Table, PlaceId }
