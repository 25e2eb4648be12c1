//! Create parking_lots table
//!
//! Prices are stored in minor units so sums stay exact on every backend.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ParkingLots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ParkingLots::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ParkingLots::PrimeLocationName)
                            .string_len(200)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingLots::PriceCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ParkingLots::Address).text().not_null())
                    .col(ColumnDef::new(ParkingLots::PinCode).string_len(10).not_null())
                    .col(
                        ColumnDef::new(ParkingLots::MaximumSpots)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ParkingLots::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ParkingLots::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum ParkingLots {
    Table,
    Id,
    PrimeLocationName,
    PriceCents,
    Address,
    PinCode,
    MaximumSpots,
    CreatedAt,
}
