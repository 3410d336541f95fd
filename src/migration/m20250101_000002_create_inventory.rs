use sea_orm::DbBackend;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // cars and pictures reference each other. SQLite cannot add a foreign
        // key after the fact but accepts a forward reference, Postgres is the opposite.
        let sqlite = manager.get_database_backend() == DbBackend::Sqlite;

        let mut cars = Table::create();
        cars.table(Cars::Table)
            .if_not_exists()
            .col(ColumnDef::new(Cars::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(Cars::Make).string_len(50).not_null())
            .col(ColumnDef::new(Cars::Model).string_len(50).not_null())
            .col(ColumnDef::new(Cars::Mileage).integer().null())
            .col(ColumnDef::new(Cars::Price).double().null())
            .col(ColumnDef::new(Cars::Color).string_len(20).null())
            .col(ColumnDef::new(Cars::Vin).string_len(17).null())
            .col(ColumnDef::new(Cars::AverageYearlyMaintenanceCost).double().null())
            .col(ColumnDef::new(Cars::Description).string_len(5000).null())
            .col(ColumnDef::new(Cars::Year).integer().null())
            .col(ColumnDef::new(Cars::IsNew).boolean().null())
            .col(ColumnDef::new(Cars::CoverImageId).uuid().null().unique_key())
            .col(
                ColumnDef::new(Cars::CreatedAt)
                    .timestamp_with_time_zone()
                    .not_null()
                    .default(Expr::current_timestamp()),
            );
        if sqlite {
            cars.foreign_key(&mut cover_image_fk());
        }
        manager.create_table(cars.to_owned()).await?;

        manager
            .create_table(
                Table::create()
                    .table(Pictures::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Pictures::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Pictures::Url).string_len(2048).not_null())
                    .col(ColumnDef::new(Pictures::CarId).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-pictures-car_id")
                            .from(Pictures::Table, Pictures::CarId)
                            .to(Cars::Table, Cars::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        if !sqlite {
            manager
                .create_foreign_key(cover_image_fk())
                .await?;
        }

        manager
            .create_index(
                Index::create()
                    .name("idx-pictures-car_id")
                    .table(Pictures::Table)
                    .col(Pictures::CarId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() != DbBackend::Sqlite {
            manager
                .drop_foreign_key(
                    ForeignKey::drop()
                        .name("fk-cars-cover_image_id")
                        .table(Cars::Table)
                        .to_owned(),
                )
                .await?;
        }
        manager
            .drop_table(Table::drop().table(Pictures::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cars::Table).to_owned())
            .await
    }
}

fn cover_image_fk() -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name("fk-cars-cover_image_id")
        .from(Cars::Table, Cars::CoverImageId)
        .to(Pictures::Table, Pictures::Id)
        .on_delete(ForeignKeyAction::Restrict)
        .to_owned()
}

#[derive(DeriveIden)]
pub enum Cars {
    Table,
    Id,
    Make,
    Model,
    Mileage,
    Price,
    Color,
    Vin,
    AverageYearlyMaintenanceCost,
    Description,
    Year,
    IsNew,
    CoverImageId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Pictures {
    Table,
    Id,
    Url,
    CarId,
}
